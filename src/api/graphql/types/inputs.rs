use async_graphql::InputObject;

use crate::error::{ForumError, Result};

pub const TITLE_MAX_CHARS: usize = 200;
pub const BODY_MAX_CHARS: usize = 10_000;
pub const PASSWORD_MIN_CHARS: usize = 8;

#[derive(InputObject, Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

impl RegisterInput {
    /// Trim and check every field, returning the cleaned input.
    ///
    /// # Errors
    /// Returns a validation error naming the first offending field.
    pub fn validate(self) -> Result<Self> {
        let username = self.username.trim().to_string();
        let len = username.chars().count();
        if !(3..=32).contains(&len) {
            return Err(ForumError::validation("username", "must be 3 to 32 characters"));
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ForumError::validation(
                "username",
                "may only contain letters, digits and underscores",
            ));
        }

        // Stored lowercase so uniqueness and login ignore case.
        let email = self.email.trim().to_lowercase();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(ForumError::validation("email", "must be an email address")),
        }

        if self.password.chars().count() < PASSWORD_MIN_CHARS {
            return Err(ForumError::validation(
                "password",
                format!("must be at least {PASSWORD_MIN_CHARS} characters"),
            ));
        }

        Ok(Self {
            username,
            email,
            password: self.password,
            display_name: non_blank(self.display_name),
        })
    }
}

#[derive(InputObject, Debug, Clone, Default)]
pub struct UpdateProfileInput {
    pub display_name: Option<String>,
    pub bio: Option<String>,
}

impl UpdateProfileInput {
    /// # Errors
    /// Returns a validation error if the bio is too long.
    pub fn validate(self) -> Result<Self> {
        let bio = self.bio.map(|b| b.trim().to_string());
        if bio.as_ref().is_some_and(|b| b.chars().count() > 2_000) {
            return Err(ForumError::validation("bio", "must be at most 2000 characters"));
        }
        Ok(Self {
            display_name: non_blank(self.display_name),
            bio,
        })
    }
}

#[derive(InputObject, Debug, Clone)]
pub struct CreateCategoryInput {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

impl CreateCategoryInput {
    /// # Errors
    /// Returns a validation error for an empty name or a malformed slug.
    pub fn validate(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ForumError::validation("name", "must not be empty"));
        }
        let slug = self.slug.trim().to_string();
        if slug.is_empty()
            || !slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ForumError::validation(
                "slug",
                "must be lowercase letters, digits and dashes",
            ));
        }
        Ok(Self {
            name,
            slug,
            description: non_blank(self.description),
        })
    }
}

#[derive(InputObject, Debug, Clone)]
pub struct CreateThreadInput {
    pub category_id: i32,
    pub title: String,
    /// Body of the opening post
    pub body: String,
}

impl CreateThreadInput {
    /// # Errors
    /// Returns a validation error for an empty or oversized title or body.
    pub fn validate(self) -> Result<Self> {
        Ok(Self {
            category_id: self.category_id,
            title: bounded("title", &self.title, TITLE_MAX_CHARS)?,
            body: bounded("body", &self.body, BODY_MAX_CHARS)?,
        })
    }
}

#[derive(InputObject, Debug, Clone)]
pub struct CreatePostInput {
    pub thread_id: i32,
    pub body: String,
}

impl CreatePostInput {
    /// # Errors
    /// Returns a validation error for an empty or oversized body.
    pub fn validate(self) -> Result<Self> {
        Ok(Self {
            thread_id: self.thread_id,
            body: bounded("body", &self.body, BODY_MAX_CHARS)?,
        })
    }
}

#[derive(InputObject, Debug, Clone)]
pub struct EditPostInput {
    pub id: i32,
    pub body: String,
}

impl EditPostInput {
    /// # Errors
    /// Returns a validation error for an empty or oversized body.
    pub fn validate(self) -> Result<Self> {
        Ok(Self {
            id: self.id,
            body: bounded("body", &self.body, BODY_MAX_CHARS)?,
        })
    }
}

fn bounded(field: &str, value: &str, max: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ForumError::validation(field, "must not be empty"));
    }
    if trimmed.chars().count() > max {
        return Err(ForumError::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: ForumError) -> String {
        match err {
            ForumError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    fn register(username: &str, email: &str, password: &str) -> RegisterInput {
        RegisterInput {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            display_name: Some("  ".to_string()),
        }
    }

    #[test]
    fn test_register_cleans_input() {
        let input = register("  ada_l ", " Ada@Example.COM ", "long enough")
            .validate()
            .unwrap();
        assert_eq!(input.username, "ada_l");
        assert_eq!(input.email, "ada@example.com");
        assert_eq!(input.display_name, None);
    }

    #[test]
    fn test_register_rejections() {
        let cases = [
            (register("ab", "a@b.c", "password1"), "username"),
            (register("not ok!", "a@b.c", "password1"), "username"),
            (register("ada", "nope", "password1"), "email"),
            (register("ada", "@b.c", "password1"), "email"),
            (register("ada", "a@b.c", "short"), "password"),
        ];
        for (input, field) in cases {
            assert_eq!(field_of(input.validate().unwrap_err()), field);
        }
    }

    #[test]
    fn test_category_slug() {
        let ok = CreateCategoryInput {
            name: " General ".to_string(),
            slug: "general-talk".to_string(),
            description: None,
        };
        assert_eq!(ok.validate().unwrap().name, "General");

        let bad = CreateCategoryInput {
            name: "General".to_string(),
            slug: "General Talk".to_string(),
            description: None,
        };
        assert_eq!(field_of(bad.validate().unwrap_err()), "slug");
    }

    #[test]
    fn test_thread_and_post_bounds() {
        let thread = CreateThreadInput {
            category_id: 1,
            title: "x".repeat(TITLE_MAX_CHARS + 1),
            body: "hello".to_string(),
        };
        assert_eq!(field_of(thread.validate().unwrap_err()), "title");

        let post = CreatePostInput {
            thread_id: 1,
            body: "   \n ".to_string(),
        };
        assert_eq!(field_of(post.validate().unwrap_err()), "body");

        let edit = EditPostInput {
            id: 1,
            body: " fixed typo ".to_string(),
        };
        assert_eq!(edit.validate().unwrap().body, "fixed typo");
    }
}
