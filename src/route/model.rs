use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::store::Window;

/// Reads a query number, falling back to `default` when it is absent or
/// not a number. Out of range numbers are kept so validation can reject them.
pub fn number_or<'de, D, T>(deserializer: D, default: T) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: FromStr,
{
	let raw = Option::<String>::deserialize(deserializer)?;

	Ok(raw
		.and_then(|raw| raw.trim().parse().ok())
		.unwrap_or(default))
}

fn page_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
	number_or(deserializer, 1)
}

fn limit_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
	number_or(deserializer, 10)
}

/// These can be removed when [`serde`] supports
/// literal defaults: <https://github.com/serde-rs/serde/issues/368>
#[inline]
fn one() -> i64 {
	1
}

#[inline]
fn ten() -> i64 {
	10
}

#[derive(Debug, Clone, Copy, Deserialize, Validate, JsonSchema)]
pub struct Paginate {
	/// The page number to return (1-indexed).
	#[validate(range(min = 1))]
	#[serde(default = "one", deserialize_with = "page_or_default")]
	#[schemars(with = "i64")]
	pub page: i64,
	/// The number of items to return per page.
	#[validate(range(min = 1, max = 100))]
	#[serde(default = "ten", alias = "size", deserialize_with = "limit_or_default")]
	#[schemars(with = "i64")]
	pub limit: i64,
}

impl Default for Paginate {
	fn default() -> Self {
		Self { page: 1, limit: 10 }
	}
}

impl Paginate {
	pub fn offset(&self) -> i64 {
		self.page.saturating_sub(1).saturating_mul(self.limit)
	}

	pub fn limit(&self) -> i64 {
		self.limit
	}

	pub fn window(&self) -> Window {
		Window {
			limit: self.limit(),
			offset: self.offset(),
		}
	}
}

/// A single page of a listing.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Page<T> {
	pub items: Vec<T>,
	/// The number of items across every page.
	pub total: i64,
	pub page: i64,
	pub page_size: i64,
	pub total_pages: i64,
}

impl<T> Page<T> {
	pub fn new(items: Vec<T>, total: i64, paginate: &Paginate) -> Self {
		Self {
			items,
			total,
			page: paginate.page,
			page_size: paginate.limit,
			total_pages: (total + paginate.limit - 1) / paginate.limit,
		}
	}
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct IdInput {
	pub id: Uuid,
}

#[cfg(test)]
mod test {
	use serde_json::json;
	use validator::Validate;

	use super::*;

	#[test]
	fn test_paginate_offset() {
		let mut paginate = Paginate { page: 1, limit: 10 };

		assert_eq!(paginate.offset(), 0);

		paginate.page = 2;

		assert_eq!(paginate.offset(), 10);

		paginate.limit = 5;

		assert_eq!(paginate.offset(), 5);

		paginate.page = 3;

		assert_eq!(paginate.window(), Window { limit: 5, offset: 10 });
	}

	#[test]
	fn test_paginate_far_pages() {
		let paginate = Paginate { page: 101, limit: 1 };

		assert!(paginate.validate().is_ok());
		assert_eq!(paginate.offset(), 100);

		let paginate = Paginate {
			page: i64::MAX,
			limit: 100,
		};

		assert!(paginate.validate().is_ok());
		assert_eq!(paginate.offset(), i64::MAX);
	}

	#[test]
	fn test_paginate_lenient() {
		let paginate: Paginate = serde_json::from_value(json!({})).unwrap();

		assert_eq!((paginate.page, paginate.limit), (1, 10));

		let paginate: Paginate = serde_json::from_value(json!({ "page": "abc", "size": "5" })).unwrap();

		assert_eq!((paginate.page, paginate.limit), (1, 5));

		let paginate: Paginate = serde_json::from_value(json!({ "page": "0", "limit": "500" })).unwrap();

		let errors = paginate.validate().unwrap_err();

		assert!(errors.field_errors().contains_key("page"));
		assert!(errors.field_errors().contains_key("limit"));
	}

	#[test]
	fn test_total_pages() {
		let paginate = Paginate { page: 3, limit: 10 };
		let page = Page::new(vec![1, 2, 3], 23, &paginate);

		assert_eq!(page.total_pages, 3);
		assert_eq!(page.page_size, 10);

		assert_eq!(Page::<i32>::new(Vec::new(), 0, &paginate).total_pages, 0);
		assert_eq!(Page::<i32>::new(Vec::new(), 20, &paginate).total_pages, 2);
	}
}
