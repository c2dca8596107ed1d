use kernel::id::Id;

pub struct UserMarker;

/// Stable user identifier; the only field of a user record that never changes
pub type UserId = Id<UserMarker>;
