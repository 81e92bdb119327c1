use aide::{
	openapi::{ApiKeyLocation, SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{error, extract::Json};

pub const SECURITY_SCHEME_BEARER: &str = "Bearer";

pub mod tag {
	pub const AUTH: &str = "Auth";
	pub const POST: &str = "Post";
	pub const COMMENT: &str = "Comment";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Blog API")
		.summary("Posts, threaded comments and reactions")
		.description(include_str!("../README.md"))
		.tag(Tag {
			name: tag::AUTH.into(),
			description: Some("Registration and bearer tokens".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::POST.into(),
			description: Some("Posts and their tags".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::COMMENT.into(),
			description: Some("Comments, replies and reactions".into()),
			..Default::default()
		})
		.security_scheme(
			SECURITY_SCHEME_BEARER,
			SecurityScheme::ApiKey {
				location: ApiKeyLocation::Header,
				name: "Authorization".into(),
				description: Some("A token from /auth/login, sent as `Bearer <token>`".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<error::Message<'static>>, _>(|res| {
			res.example(
				error::Message::new("unknown_post")
					.field("post")
					.detail("post", "5c1a8b4e-2f36-4f7e-9d0c-3b1f6a2e9d47"),
			)
		})
}
