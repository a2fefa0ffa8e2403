//! Users service: registration, sign-in, recovery, profile

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{decode_role, required_id, ApiClient};
use crate::error::{Result, TaskflowError};
use crate::model::{Role, User};

/// Input for account registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    /// Captcha answer, when the gateway enforces one
    pub captcha_response: Option<String>,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    firstname: &'a str,
    lastname: &'a str,
    username: &'a str,
    email: &'a str,
    password: &'a str,
    role: &'a str,
    #[serde(rename = "captchaResponse")]
    captcha_response: &'a str,
}

#[derive(Serialize)]
struct VerifyBody<'a> {
    username: &'a str,
    code: &'a str,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenDto {
    #[serde(default, alias = "Token", alias = "jwt")]
    token: Option<String>,
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct RecoverBody<'a> {
    username: &'a str,
    #[serde(rename = "newPassword")]
    new_password: &'a str,
}

#[derive(Serialize)]
struct ChangePasswordBody<'a> {
    #[serde(rename = "userName")]
    username: &'a str,
    #[serde(rename = "currentPassword")]
    current_password: &'a str,
    #[serde(rename = "newPassword")]
    new_password: &'a str,
}

#[derive(Deserialize)]
struct UserDto {
    #[serde(default, alias = "_id", alias = "ID")]
    id: Option<Value>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default, alias = "firstName", alias = "first_name")]
    firstname: Option<String>,
    #[serde(default, alias = "lastName", alias = "last_name")]
    lastname: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<Value>,
}

/// `GET /users/{username}` answers either `{"user": {...}}` or the bare object
#[derive(Deserialize)]
#[serde(untagged)]
enum UserEnvelope {
    Wrapped { user: UserDto },
    Bare(UserDto),
}

impl UserDto {
    fn decode(self, endpoint: &str) -> Result<User> {
        Ok(User {
            id: required_id(endpoint, "user id", self.id.as_ref())?,
            username: self
                .username
                .ok_or_else(|| TaskflowError::decode(endpoint, "missing username"))?,
            first_name: self.firstname.unwrap_or_default(),
            last_name: self.lastname.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            role: self.role.as_ref().and_then(decode_role).unwrap_or(Role::User),
        })
    }
}

impl ApiClient {
    pub async fn register(&self, registration: &Registration) -> Result<()> {
        let body = RegisterBody {
            firstname: &registration.first_name,
            lastname: &registration.last_name,
            username: &registration.username,
            email: &registration.email,
            password: &registration.password,
            role: registration.role.as_str(),
            captcha_response: registration.captcha_response.as_deref().unwrap_or(""),
        };
        self.post("/users/register", &["users", "register"], &body)
            .await?;
        info!(username = %registration.username, "registration submitted");
        Ok(())
    }

    pub async fn verify(&self, username: &str, code: &str) -> Result<()> {
        self.post(
            "/users/verify",
            &["users", "verify"],
            &VerifyBody { username, code },
        )
        .await
    }

    /// Exchange credentials for a token
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        const ENDPOINT: &str = "/users/login";
        let dto: TokenDto = self
            .post_for(ENDPOINT, &["users", "login"], &LoginBody { username, password })
            .await?;
        dto.token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| TaskflowError::decode(ENDPOINT, "missing token"))
    }

    pub async fn request_magic_link(&self, email: &str) -> Result<()> {
        self.post("/users/magic-link", &["users", "magic-link"], &EmailBody { email })
            .await
    }

    pub async fn request_password_recovery(&self, email: &str) -> Result<()> {
        self.post("/users/recovery", &["users", "recovery"], &EmailBody { email })
            .await
    }

    pub async fn recover_password(&self, username: &str, new_password: &str) -> Result<()> {
        self.put(
            "/users/recover-password",
            &["users", "recover-password"],
            &RecoverBody {
                username,
                new_password,
            },
        )
        .await
    }

    pub async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        self.put(
            "/users/change-password",
            &["users", "change-password"],
            &ChangePasswordBody {
                username,
                current_password,
                new_password,
            },
        )
        .await
    }

    pub async fn get_user(&self, username: &str) -> Result<User> {
        const ENDPOINT: &str = "/users/{username}";
        let envelope: UserEnvelope = self.get(ENDPOINT, &["users", username]).await?;
        match envelope {
            UserEnvelope::Wrapped { user } | UserEnvelope::Bare(user) => user.decode(ENDPOINT),
        }
    }

    pub async fn delete_user(&self, username: &str) -> Result<()> {
        self.delete("/users/{username}", &["users", username]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> Result<User> {
        let envelope: UserEnvelope = serde_json::from_value(value)?;
        match envelope {
            UserEnvelope::Wrapped { user } | UserEnvelope::Bare(user) => user.decode("/users"),
        }
    }

    #[test]
    fn test_wrapped_and_bare_user() {
        let wrapped = decode(json!({"user": {
            "id": 3, "username": "ana", "firstName": "Ana", "lastName": "P",
            "email": "a@x.io", "role": "Manager"
        }}))
        .unwrap();
        assert_eq!(wrapped.id, "3");
        assert_eq!(wrapped.first_name, "Ana");
        assert_eq!(wrapped.role, Role::Manager);

        let bare = decode(json!({"_id": "u9", "username": "bo", "role": "ROLE_USER"})).unwrap();
        assert_eq!(bare.id, "u9");
        assert_eq!(bare.role, Role::User);
        assert_eq!(bare.email, "");
    }

    #[test]
    fn test_user_without_username_is_decode_error() {
        assert!(matches!(
            decode(json!({"id": "u1"})),
            Err(TaskflowError::Decode { .. })
        ));
    }

    #[test]
    fn test_change_password_body_names() {
        let body = serde_json::to_value(ChangePasswordBody {
            username: "ana",
            current_password: "old",
            new_password: "new",
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"userName": "ana", "currentPassword": "old", "newPassword": "new"})
        );
    }
}
