use rocket::request::{FromRequest, Outcome};
use rocket::Request;

use std::convert::Infallible;

use crate::config::{CompanionConfig, DEFAULT_USER};
use crate::data::UserID;

pub const USER_HEADER: &str = "X-User-Id";

/// The caller, identified by the `X-User-Id` header. There is no
/// authentication; a missing header means the configured default user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub UserID);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentUser {
    type Error = Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let header = request
            .headers()
            .get_one(USER_HEADER)
            .map(str::trim)
            .filter(|user| !user.is_empty());

        let user = match header {
            Some(user) => user.to_string(),
            None => match request.rocket().state::<CompanionConfig>() {
                Some(config) => config.default_user.clone(),
                None => DEFAULT_USER.to_string(),
            },
        };

        Outcome::Success(CurrentUser(user))
    }
}
