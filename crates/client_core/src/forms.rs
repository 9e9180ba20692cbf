//! Client-side checks for the account, dependent and payment forms.

use shared::{
    domain::{Role, UserId},
    protocol::{CreateDependentRequest, LoginRequest, RegisterRequest},
};

use crate::error::FormError;

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginRequest, FormError> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return Err(FormError::MissingCredentials);
        }
        Ok(LoginRequest {
            email: email.to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone1: String,
    pub phone2: String,
    pub house_number: String,
    pub street_name: String,
    pub postal_code: String,
    pub role: Role,
}

impl Default for RegistrationForm {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password: String::new(),
            phone1: String::new(),
            phone2: String::new(),
            house_number: String::new(),
            street_name: String::new(),
            postal_code: String::new(),
            role: Role::Parent,
        }
    }
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<RegisterRequest, FormError> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(FormError::MissingName);
        }
        Ok(RegisterRequest {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            phone1: self.phone1.trim().to_string(),
            phone2: self.phone2.trim().to_string(),
            house_number: self.house_number.trim().to_string(),
            street_name: self.street_name.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            role: self.role,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewDependentForm {
    pub first_name: String,
    pub surname: String,
    pub age: String,
}

impl NewDependentForm {
    pub fn validate(&self, guardian: UserId) -> Result<CreateDependentRequest, FormError> {
        let first_name = self.first_name.trim();
        let surname = self.surname.trim();
        let age = self.age.trim();
        if first_name.is_empty() || surname.is_empty() || age.is_empty() {
            return Err(FormError::MissingDependentDetails);
        }
        let age = age
            .parse::<u8>()
            .ok()
            .filter(|age| (1..=18).contains(age))
            .ok_or(FormError::DependentAgeOutOfRange)?;
        Ok(CreateDependentRequest {
            child_name: first_name.to_string(),
            child_surname: surname.to_string(),
            child_age: age,
            parent_id: guardian,
        })
    }
}

/// Card details captured on the checkout screen. Only the shape of the input
/// is checked here; authorisation happens elsewhere.
#[derive(Debug, Clone, Default)]
pub struct PaymentCard {
    pub card_number: String,
    pub expiry: String,
    pub cvv: String,
}

impl PaymentCard {
    pub fn validate(&self) -> Result<(), FormError> {
        if self.card_number.trim().is_empty()
            || self.expiry.trim().is_empty()
            || self.cvv.trim().is_empty()
        {
            return Err(FormError::MissingPaymentDetails);
        }

        let digits: String = self
            .card_number
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if digits.len() != 16 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(FormError::InvalidCardNumber);
        }

        if !valid_expiry(self.expiry.trim()) {
            return Err(FormError::InvalidExpiry);
        }

        let cvv = self.cvv.trim();
        if !(3..=4).contains(&cvv.len()) || !cvv.chars().all(|c| c.is_ascii_digit()) {
            return Err(FormError::InvalidCvv);
        }
        Ok(())
    }

    /// Last four digits, for display on the confirmation screen.
    pub fn masked(&self) -> String {
        let digits: Vec<char> = self
            .card_number
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        let tail: String = digits[digits.len().saturating_sub(4)..].iter().collect();
        format!("**** **** **** {tail}")
    }
}

fn valid_expiry(expiry: &str) -> bool {
    let Some((month, year)) = expiry.split_once('/') else {
        return false;
    };
    if month.len() != 2 || year.len() != 2 || !year.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    matches!(month.parse::<u8>(), Ok(1..=12))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(number: &str, expiry: &str, cvv: &str) -> PaymentCard {
        PaymentCard {
            card_number: number.into(),
            expiry: expiry.into(),
            cvv: cvv.into(),
        }
    }

    #[test]
    fn login_requires_both_credentials() {
        let form = LoginForm {
            email: "  ".into(),
            password: "secret".into(),
        };
        assert_eq!(form.validate().unwrap_err(), FormError::MissingCredentials);

        let form = LoginForm {
            email: " thandi@example.com ".into(),
            password: "secret".into(),
        };
        assert_eq!(form.validate().expect("valid").email, "thandi@example.com");
    }

    #[test]
    fn registration_requires_names() {
        let mut form = RegistrationForm {
            first_name: "Thandi".into(),
            ..RegistrationForm::default()
        };
        assert_eq!(form.validate().unwrap_err(), FormError::MissingName);
        form.last_name = "Zungu".into();
        assert_eq!(form.validate().expect("valid").role, Role::Parent);
    }

    #[test]
    fn dependent_age_must_be_between_one_and_eighteen() {
        let mut form = NewDependentForm {
            first_name: "Buhle".into(),
            surname: "Zungu".into(),
            age: "0".into(),
        };
        assert_eq!(
            form.validate(UserId(1)).unwrap_err(),
            FormError::DependentAgeOutOfRange
        );
        form.age = "19".into();
        assert_eq!(
            form.validate(UserId(1)).unwrap_err(),
            FormError::DependentAgeOutOfRange
        );
        form.age = "7".into();
        let request = form.validate(UserId(1)).expect("valid");
        assert_eq!(request.child_age, 7);
        assert_eq!(request.parent_id, UserId(1));

        form.surname.clear();
        assert_eq!(
            form.validate(UserId(1)).unwrap_err(),
            FormError::MissingDependentDetails
        );
    }

    #[test]
    fn payment_card_checks_run_in_order() {
        assert_eq!(
            card("", "12/27", "123").validate().unwrap_err(),
            FormError::MissingPaymentDetails
        );
        assert_eq!(
            card("4111 1111 1111 111", "12/27", "123").validate().unwrap_err(),
            FormError::InvalidCardNumber
        );
        assert_eq!(
            card("4111 1111 1111 1111", "13/27", "123").validate().unwrap_err(),
            FormError::InvalidExpiry
        );
        assert_eq!(
            card("4111 1111 1111 1111", "1227", "123").validate().unwrap_err(),
            FormError::InvalidExpiry
        );
        assert_eq!(
            card("4111 1111 1111 1111", "12/27", "12").validate().unwrap_err(),
            FormError::InvalidCvv
        );
        card("4111 1111 1111 1111", "12/27", "123")
            .validate()
            .expect("valid card");
    }

    #[test]
    fn masks_all_but_last_four_digits() {
        assert_eq!(
            card("4111 1111 1111 4242", "12/27", "123").masked(),
            "**** **** **** 4242"
        );
    }
}
