use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::utils::validation::field_error;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// 姓名，未填写时为空字符串
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// 注册表单
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SignupForm {
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub last_name: String,

    #[serde(default)]
    #[validate(custom = "crate::utils::validation::validate_username")]
    pub username: String,

    #[serde(default)]
    #[validate(custom = "crate::utils::validation::validate_optional_email")]
    pub email: String,

    #[serde(default, skip_serializing)]
    #[validate(custom = "crate::utils::validation::validate_password_strength")]
    pub password1: String,

    #[serde(default, skip_serializing)]
    pub password2: String,
}

impl SignupForm {
    /// 字段校验加两次密码一致性校验
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if self.password1 != self.password2 {
            errors.add(
                "password2",
                field_error("password_mismatch", "The two password fields didn't match."),
            );
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(custom = "crate::utils::validation::validate_not_blank")]
    pub username: String,

    #[serde(default, skip_serializing)]
    #[validate(custom = "crate::utils::validation::validate_not_blank")]
    pub password: String,

    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PasswordChangeForm {
    #[serde(default)]
    #[validate(custom = "crate::utils::validation::validate_not_blank")]
    pub old_password: String,

    #[serde(default)]
    #[validate(custom = "crate::utils::validation::validate_password_strength")]
    pub new_password1: String,

    #[serde(default)]
    pub new_password2: String,
}

impl PasswordChangeForm {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if self.new_password1 != self.new_password2 {
            errors.add(
                "new_password2",
                field_error("password_mismatch", "The two password fields didn't match."),
            );
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(username: &str, password1: &str, password2: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            password1: password1.to_string(),
            password2: password2.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_signup_form_valid() {
        assert!(signup("leo", "correct-horse", "correct-horse").check().is_ok());
    }

    #[test]
    fn test_signup_form_password_mismatch() {
        let errors = signup("leo", "correct-horse", "battery-staple").check().unwrap_err();
        assert!(errors.field_errors().contains_key("password2"));
    }

    #[test]
    fn test_signup_form_collects_all_errors() {
        let errors = signup("bad name", "123", "1234").check().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("password1"));
        assert!(fields.contains_key("password2"));
    }

    #[test]
    fn test_signup_form_does_not_echo_passwords() {
        let json = serde_json::to_value(signup("leo", "secret-one", "secret-one")).unwrap();
        assert!(json.get("password1").is_none());
        assert_eq!(json["username"], "leo");
    }

    #[test]
    fn test_full_name() {
        let user = User {
            id: 1,
            username: "leo".to_string(),
            first_name: "Leo".to_string(),
            last_name: String::new(),
            email: String::new(),
            password_hash: String::new(),
            date_joined: Utc::now(),
        };
        assert_eq!(user.full_name(), "Leo");
        assert!(serde_json::to_value(&user).unwrap().get("password_hash").is_none());
    }
}
