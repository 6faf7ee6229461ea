use std::collections::BTreeMap;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::Error;

/// `Json<T>` whose shape errors come back as a 422 field map instead of
/// axum's plain-text rejection.
pub struct JsonPayload<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonPayload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(JsonRejection::JsonDataError(err)) => {
                Err(Error::InvalidFields(data_error_fields(&err.body_text())))
            }
            Err(rejection) => Err(Error::BadRequest(rejection.body_text())),
        }
    }
}

/// Turns a serde data error ("missing field `title`", "salary_min: invalid
/// type: ...") into `{ field: [message] }`. Errors that name no field land
/// under `body`.
pub fn data_error_fields(text: &str) -> BTreeMap<String, Vec<String>> {
    let detail = text
        .split_once("target type: ")
        .map_or(text, |(_, detail)| detail);

    let (field, message) = if let Some(field) = detail
        .split_once("missing field `")
        .and_then(|(_, rest)| rest.split_once('`'))
        .map(|(field, _)| field)
    {
        (
            field.to_string(),
            format!("The {} field is required.", field.replace('_', " ")),
        )
    } else if let Some(field) = detail
        .split_once(": ")
        .map(|(path, _)| path)
        .filter(|path| !path.is_empty() && !path.contains(' '))
        .and_then(|path| path.split(['.', '[']).next())
    {
        (
            field.to_string(),
            format!("The {} field has an invalid value.", field.replace('_', " ")),
        )
    } else {
        (
            "body".to_string(),
            "The request body does not match the expected format.".to_string(),
        )
    };

    BTreeMap::from([(field, vec![message])])
}
