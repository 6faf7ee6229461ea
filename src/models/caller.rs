use crate::models::user::Role;

/// Authenticated principal of a request.
///
/// Built by the bearer-token middleware; services receive it explicitly instead
/// of reaching for ambient auth state, so an unauthenticated call cannot reach
/// them at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Admin(i64),
    Recruiter(i64),
    Candidate(i64),
}

impl Caller {
    pub fn new(user_id: i64, role: Role) -> Self {
        match role {
            Role::Admin => Caller::Admin(user_id),
            Role::Recruiter => Caller::Recruiter(user_id),
            Role::Candidate => Caller::Candidate(user_id),
        }
    }

    pub fn user_id(&self) -> i64 {
        match *self {
            Caller::Admin(id) | Caller::Recruiter(id) | Caller::Candidate(id) => id,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Caller::Admin(_))
    }

    /// Admin, or the recruiter with the given id.
    pub fn can_manage_offer_of(&self, owner_id: i64) -> bool {
        match *self {
            Caller::Admin(_) => true,
            Caller::Recruiter(id) => id == owner_id,
            Caller::Candidate(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_owner_recruiter_or_admin_manage_offers() {
        assert!(Caller::Admin(1).can_manage_offer_of(99));
        assert!(Caller::Recruiter(99).can_manage_offer_of(99));
        assert!(!Caller::Recruiter(98).can_manage_offer_of(99));
        assert!(!Caller::Candidate(99).can_manage_offer_of(99));
    }
}
