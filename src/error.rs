use std::borrow::Cow;

use axum::{
	extract::rejection::{PathRejection, QueryRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
};
use axum_jsonschema::JsonSchemaRejection;
use schemars::JsonSchema;
use serde::Serialize;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::store;

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message presented to the client.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message<'a> {
	/// A machine-readable description of the error.
	pub content: Cow<'a, str>,
	/// The input field the error is related to, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'a, str>>,
	/// Additional context, such as the id of a missing resource.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Cow<'a, Map>>,
}

impl<'a> Message<'a> {
	pub fn new(content: impl Into<Cow<'a, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	pub fn field(mut self, field: impl Into<Cow<'a, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	pub fn detail(mut self, key: &str, value: impl Serialize) -> Self {
		let details = self.details.get_or_insert_with(|| Cow::Owned(Map::new()));

		details
			.to_mut()
			.insert(key.into(), serde_json::to_value(value).unwrap_or_default());

		self
	}
}

#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
	errors: Vec<Message<'a>>,
}

/// The shape of an error returned by a route: its status code and the
/// messages shown to the client.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn errors(&self) -> Vec<Message<'_>>;
}

/// Errors shared by every route, such as rejected input and store failures.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("invalid json body")]
	Json(JsonSchemaRejection),
	#[error("invalid query: {0}")]
	Query(#[from] QueryRejection),
	#[error("invalid path: {0}")]
	Path(#[from] PathRejection),
	#[error("store error: {0}")]
	Store(#[from] store::Error),
	#[error("rate limited: {0}")]
	RateLimited(#[from] tower_governor::GovernorError),
}

impl From<JsonSchemaRejection> for AppError {
	fn from(rejection: JsonSchemaRejection) -> Self {
		Self::Json(rejection)
	}
}

fn validation_message(field: &str, error: &ValidationError) -> Message<'static> {
	Message {
		content: error.code.clone(),
		field: Some(Cow::Owned(field.to_owned())),
		details: (error.params.len() > usize::from(error.params.contains_key("value"))).then(|| {
			Cow::Owned(
				error
					.params
					.iter()
					// never echo the rejected input back
					.filter(|(key, _)| **key != "value")
					.map(|(key, value)| (key.to_string(), value.clone()))
					.collect(),
			)
		}),
	}
}

/// Collects the errors of every field, including those of nested structs.
///
/// Nested structs are flattened into their parent's input, so their fields
/// are reported under their own names.
fn validation_messages(errors: &ValidationErrors, messages: &mut Vec<Message<'static>>) {
	for (field, kind) in errors.errors() {
		match kind {
			ValidationErrorsKind::Field(errors) => {
				messages.extend(errors.iter().map(|error| validation_message(field, error)));
			}
			ValidationErrorsKind::Struct(errors) => validation_messages(errors, messages),
			ValidationErrorsKind::List(errors) => {
				for errors in errors.values() {
					validation_messages(errors, messages);
				}
			}
		}
	}
}

impl AppError {
	fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) | Self::Query(..) | Self::Path(..) | Self::Json(..) => {
				StatusCode::BAD_REQUEST
			}
			Self::Store(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::RateLimited(..) => StatusCode::TOO_MANY_REQUESTS,
		}
	}

	fn errors(&self) -> Vec<Message<'_>> {
		match self {
			Self::Validation(errors) => {
				let mut messages = Vec::new();

				validation_messages(errors, &mut messages);
				messages
			}
			Self::Query(rejection) => vec![Message::new("invalid_query").detail("reason", rejection.body_text())],
			Self::Path(rejection) => vec![Message::new("invalid_path").detail("reason", rejection.body_text())],
			Self::Json(..) => vec![Message::new("invalid_body")],
			Self::Store(..) => vec![Message::new("internal_error")],
			Self::RateLimited(..) => vec![Message::new("too_many_requests")],
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		match self {
			// The rejection knows best where the body went wrong.
			Self::Json(rejection) => rejection.into_response(),
			error => {
				if let Self::Store(ref source) = error {
					tracing::error!(error = %source, "store failure");
				}

				let status = error.status();
				let body = ErrorResponse {
					errors: error.errors(),
				};

				(status, axum::Json(body)).into_response()
			}
		}
	}
}

/// The error returned by a route: either one of the route's own errors,
/// described by its [`ErrorShape`], or an [`AppError`].
#[derive(Debug)]
pub enum RouteError<E> {
	App(AppError),
	Route(E),
}

impl<E: ErrorShape> From<E> for RouteError<E> {
	fn from(error: E) -> Self {
		Self::Route(error)
	}
}

impl<E> From<AppError> for RouteError<E> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<E> From<store::Error> for RouteError<E> {
	fn from(error: store::Error) -> Self {
		Self::App(error.into())
	}
}

impl<E: ErrorShape> IntoResponse for RouteError<E> {
	fn into_response(self) -> Response {
		match self {
			Self::App(error) => error.into_response(),
			Self::Route(error) => {
				let status = error.status();

				if status.is_server_error() {
					tracing::error!(%error, "route failure");
				}

				let body = ErrorResponse {
					errors: error.errors(),
				};

				(status, axum::Json(body)).into_response()
			}
		}
	}
}

impl<E> aide::OperationOutput for RouteError<E> {
	type Inner = Self;
}
