use crate::format;

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: String,
}

impl User {
    /// "First Last" when either is set, otherwise the username.
    pub fn display_name(&self) -> String {
        full_name(&self.first_name, &self.last_name, &self.username)
    }
}

pub(crate) fn full_name(first: &str, last: &str, username: &str) -> String {
    let name = format!("{} {}", first.trim(), last.trim());
    let name = name.trim();
    if name.is_empty() {
        username.to_string()
    } else {
        name.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// The part of a group shown alongside a post.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRef {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

/// A post joined with its author and group.
#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub image: Option<String>,
    pub created_at: String,
    pub author_id: i64,
    pub author_username: String,
    pub author_name: String,
    pub group: Option<GroupRef>,
}

impl Post {
    pub fn pub_date(&self) -> String {
        format::format_date(&self.created_at)
    }

    pub fn image_url(&self) -> Option<String> {
        self.image.as_ref().map(|path| format!("/media/{}", path))
    }

    pub fn group_id(&self) -> Option<i64> {
        self.group.as_ref().map(|g| g.id)
    }
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_username: String,
    pub text: String,
    pub created_at: String,
}

impl Comment {
    pub fn created(&self) -> String {
        format::format_relative(&self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_falls_back_to_username() {
        assert_eq!(full_name("", " ", "leo"), "leo");
        assert_eq!(full_name("Leo", "", "leo"), "Leo");
        assert_eq!(full_name("Leo", "Tolstoy", "leo"), "Leo Tolstoy");
    }

    #[test]
    fn image_url_is_under_media() {
        let post = Post {
            id: 1,
            text: "t".into(),
            image: Some("posts/a.gif".into()),
            created_at: "2025-01-15 12:00:00".into(),
            author_id: 1,
            author_username: "leo".into(),
            author_name: "leo".into(),
            group: None,
        };
        assert_eq!(post.image_url().as_deref(), Some("/media/posts/a.gif"));
        assert_eq!(post.pub_date(), "15 January 2025");
    }
}
