//! Blog operations that span more than one record, keeping the
//! denormalized counters on posts and comments consistent.

use axum::http::StatusCode;
use uuid::Uuid;

use crate::{
	error::{self, ErrorShape},
	store::{self, Unique},
};

pub mod cascade;
pub mod comments;
pub mod tags;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(Uuid),
	#[error("unknown comment {0}")]
	UnknownComment(Uuid),
	#[error("unknown parent comment {0}")]
	UnknownParentComment(Uuid),
	#[error("parent comment {parent} does not belong to post {post}")]
	ParentCommentMismatch { parent: Uuid, post: Uuid },
	#[error("not the author")]
	NotAuthor,
	#[error("a post with the same text already exists")]
	DuplicatePost,
	#[error("store error: {0}")]
	Store(store::Error),
}

impl From<store::Error> for Error {
	fn from(error: store::Error) -> Self {
		match error {
			store::Error::Duplicate(Unique::PostText) => Self::DuplicatePost,
			error => Self::Store(error),
		}
	}
}

impl ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) | Self::UnknownComment(..) | Self::UnknownParentComment(..) => {
				StatusCode::NOT_FOUND
			}
			Self::ParentCommentMismatch { .. } => StatusCode::BAD_REQUEST,
			Self::NotAuthor => StatusCode::FORBIDDEN,
			Self::DuplicatePost => StatusCode::CONFLICT,
			Self::Store(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn errors(&self) -> Vec<error::Message<'_>> {
		vec![match self {
			Self::UnknownPost(post) => error::Message::new("unknown_post").detail("post", post),
			Self::UnknownComment(comment) => {
				error::Message::new("unknown_comment").detail("comment", comment)
			}
			Self::UnknownParentComment(parent) => error::Message::new("unknown_parent_comment")
				.field("parent_comment")
				.detail("parent_comment", parent),
			Self::ParentCommentMismatch { parent, post } => {
				error::Message::new("parent_comment_mismatch")
					.field("parent_comment")
					.detail("parent_comment", parent)
					.detail("post", post)
			}
			Self::NotAuthor => error::Message::new("not_author"),
			Self::DuplicatePost => error::Message::new("duplicate_post").field("text"),
			Self::Store(..) => error::Message::new("internal_error"),
		}]
	}
}
