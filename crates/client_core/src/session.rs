use shared::{
    domain::{Role, UserId},
    protocol::LoginResponse,
};

/// Identity obtained at login. Passed explicitly to every operation that
/// acts on behalf of the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub user_id: UserId,
    pub role: Role,
    pub display_name: String,
}

impl SessionContext {
    pub fn new(user_id: UserId, role: Role, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            role,
            display_name: display_name.into(),
        }
    }

    pub fn landing_view(&self) -> LandingView {
        LandingView::for_role(self.role)
    }

    pub fn welcome_message(&self) -> String {
        match self.role {
            Role::Driver => format!(
                "Welcome back, {}! View your assigned trips.",
                self.display_name
            ),
            Role::Nanny => format!(
                "Welcome back, {}! View your assigned sessions.",
                self.display_name
            ),
            Role::Parent => format!(
                "Welcome back, {}! Book a session for your child.",
                self.display_name
            ),
        }
    }
}

impl From<LoginResponse> for SessionContext {
    fn from(value: LoginResponse) -> Self {
        Self::new(value.id, value.role, value.first_name)
    }
}

/// Screen a user lands on after login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandingView {
    SessionList,
    CaregiverSessions,
    TransportTrips,
}

impl LandingView {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Parent => LandingView::SessionList,
            Role::Nanny => LandingView::CaregiverSessions,
            Role::Driver => LandingView::TransportTrips,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_each_role_to_its_landing_view() {
        let nanny = SessionContext::new(UserId(2), Role::Nanny, "Sipho");
        assert_eq!(nanny.landing_view(), LandingView::CaregiverSessions);
        assert_eq!(LandingView::for_role(Role::Driver), LandingView::TransportTrips);
        assert_eq!(LandingView::for_role(Role::Parent), LandingView::SessionList);
        assert!(nanny.welcome_message().contains("Sipho"));
    }
}
