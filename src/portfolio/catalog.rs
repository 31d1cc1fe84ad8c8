//! Public catalog query: filter normalization and read projections.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::portfolio::Category;

pub const DEFAULT_LIMIT: u32 = 12;
pub const MAX_LIMIT: u32 = 100;

/// Raw query string parameters of `GET /portfolios/public`.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    /// Free-text keyword, matched case-insensitively against title,
    /// description and tags.
    #[serde(alias = "q")]
    pub keyword: Option<String>,
    pub year: Option<i32>,
    pub category: Option<Category>,
    pub university: Option<String>,
    /// Comma-separated tag list; results must carry all of them.
    pub tag: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl CatalogQuery {
    /// Normalize into a bounded [`CatalogFilter`].
    pub fn normalize(self) -> CatalogFilter {
        let keyword = self
            .keyword
            .map(|k| k.trim().to_owned())
            .filter(|k| !k.is_empty());
        let university = self
            .university
            .map(|u| u.trim().to_owned())
            .filter(|u| !u.is_empty());
        let tags = self
            .tag
            .map(|raw| {
                raw.split(',')
                    .map(|t| t.trim().to_owned())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        CatalogFilter {
            keyword,
            year: self.year,
            category: self.category,
            university,
            tags,
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }
}

/// Normalized catalog filter, ready to be turned into SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogFilter {
    pub keyword: Option<String>,
    pub year: Option<i32>,
    pub category: Option<Category>,
    pub university: Option<String>,
    pub tags: Vec<String>,
    pub page: u32,
    pub limit: u32,
}

impl CatalogFilter {
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    /// `ILIKE` pattern for the keyword, with LIKE metacharacters
    /// escaped so user input stays a plain substring.
    pub fn keyword_pattern(&self) -> Option<String> {
        self.keyword.as_ref().map(|k| {
            let escaped =
                k.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
            format!("%{escaped}%")
        })
    }
}

/// One public catalog entry.
///
/// A read projection only: no credentials, no review comments.
#[derive(Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CatalogItem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub year: i32,
    pub category: Category,
    pub university: String,
    pub student_name: String,
    pub cover_url: String,
}

/// A page of catalog results with its metadata.
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogPage {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub items: Vec<CatalogItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_clamped_to_maximum() {
        let filter = CatalogQuery {
            limit: Some(5000),
            ..Default::default()
        }
        .normalize();
        assert_eq!(filter.limit, MAX_LIMIT);

        let filter = CatalogQuery {
            limit: Some(0),
            ..Default::default()
        }
        .normalize();
        assert_eq!(filter.limit, 1);
    }

    #[test]
    fn test_page_defaults_and_offset() {
        let filter = CatalogQuery::default().normalize();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, DEFAULT_LIMIT);
        assert_eq!(filter.offset(), 0);

        let filter = CatalogQuery {
            page: Some(3),
            limit: Some(20),
            ..Default::default()
        }
        .normalize();
        assert_eq!(filter.offset(), 40);
    }

    #[test]
    fn test_blank_keyword_dropped() {
        let filter = CatalogQuery {
            keyword: Some("   ".into()),
            ..Default::default()
        }
        .normalize();
        assert_eq!(filter.keyword, None);
        assert_eq!(filter.keyword_pattern(), None);
    }

    #[test]
    fn test_keyword_pattern_escapes_like_metacharacters() {
        let filter = CatalogQuery {
            keyword: Some("100%_done".into()),
            ..Default::default()
        }
        .normalize();
        assert_eq!(
            filter.keyword_pattern().unwrap(),
            "%100\\%\\_done%"
        );
    }

    #[test]
    fn test_tags_split_and_trimmed() {
        let filter = CatalogQuery {
            tag: Some("AI, Design ,,  ".into()),
            ..Default::default()
        }
        .normalize();
        assert_eq!(filter.tags, vec!["AI".to_owned(), "Design".to_owned()]);
    }
}
