#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    SiteManager = 2,
    Contractor = 3,
    System = 4,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::SiteManager),
            3 => Some(Role::Contractor),
            4 => Some(Role::System),
            _ => None,
        }
    }
}
