use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::db::models::{full_name, GroupRef, Post};

/// Which posts a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// Posts by every author the given user follows.
    FollowedBy(i64),
}

impl PostFilter {
    fn clause(&self) -> (&'static str, Vec<i64>) {
        match *self {
            PostFilter::All => ("", Vec::new()),
            PostFilter::Group(id) => ("WHERE p.group_id = ?", vec![id]),
            PostFilter::Author(id) => ("WHERE p.author_id = ?", vec![id]),
            PostFilter::FollowedBy(id) => (
                "WHERE p.author_id IN (SELECT author_id FROM follows WHERE user_id = ?)",
                vec![id],
            ),
        }
    }
}

pub struct NewPost<'a> {
    pub author_id: i64,
    pub text: &'a str,
    pub group_id: Option<i64>,
    pub image: Option<&'a str>,
}

const POST_SELECT: &str = "SELECT p.id, p.text, p.image, p.created_at, p.author_id,
        u.username, u.first_name, u.last_name, g.id, g.title, g.slug
     FROM posts p
     JOIN users u ON u.id = p.author_id
     LEFT JOIN post_groups g ON g.id = p.group_id";

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    let username: String = row.get(5)?;
    let first_name: String = row.get(6)?;
    let last_name: String = row.get(7)?;
    let group = match row.get::<_, Option<i64>>(8)? {
        Some(id) => Some(GroupRef {
            id,
            title: row.get(9)?,
            slug: row.get(10)?,
        }),
        None => None,
    };

    Ok(Post {
        id: row.get(0)?,
        text: row.get(1)?,
        image: row.get(2)?,
        created_at: row.get(3)?,
        author_id: row.get(4)?,
        author_name: full_name(&first_name, &last_name, &username),
        author_username: username,
        group,
    })
}

pub fn count(conn: &Connection, filter: PostFilter) -> rusqlite::Result<i64> {
    let (clause, args) = filter.clause();
    conn.query_row(
        &format!("SELECT COUNT(*) FROM posts p {}", clause),
        params_from_iter(args),
        |row| row.get(0),
    )
}

/// One window of posts, newest first.
pub fn list(
    conn: &Connection,
    filter: PostFilter,
    limit: usize,
    offset: usize,
) -> rusqlite::Result<Vec<Post>> {
    let (clause, mut args) = filter.clause();
    args.push(limit as i64);
    args.push(offset as i64);

    let mut stmt = conn.prepare(&format!(
        "{} {} ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?",
        POST_SELECT, clause
    ))?;
    let posts = stmt
        .query_map(params_from_iter(args), post_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

pub fn find(conn: &Connection, id: i64) -> rusqlite::Result<Option<Post>> {
    conn.query_row(
        &format!("{} WHERE p.id = ?1", POST_SELECT),
        params![id],
        post_from_row,
    )
    .optional()
}

pub fn create(conn: &Connection, post: &NewPost<'_>) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO posts (author_id, text, group_id, image) VALUES (?1, ?2, ?3, ?4)",
        params![post.author_id, post.text, post.group_id, post.image],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Replace a post's editable fields. Author and creation time never change.
pub fn update(
    conn: &Connection,
    id: i64,
    text: &str,
    group_id: Option<i64>,
    image: Option<&str>,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE posts SET text = ?1, group_id = ?2, image = ?3 WHERE id = ?4",
        params![text, group_id, image, id],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let removed = conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
    Ok(removed > 0)
}
