use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::Group;

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
    })
}

/// Slugs are non-empty runs of ASCII letters, digits, hyphens and underscores.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn create(
    conn: &Connection,
    title: &str,
    slug: &str,
    description: &str,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO post_groups (title, slug, description) VALUES (?1, ?2, ?3)",
        params![title, slug, description],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_slug(conn: &Connection, slug: &str) -> rusqlite::Result<Option<Group>> {
    conn.query_row(
        "SELECT id, title, slug, description FROM post_groups WHERE slug = ?1",
        params![slug],
        group_from_row,
    )
    .optional()
}

pub fn exists(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM post_groups WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
}

/// All groups, for the group picker on the post form.
pub fn list_all(conn: &Connection) -> rusqlite::Result<Vec<Group>> {
    let mut stmt =
        conn.prepare("SELECT id, title, slug, description FROM post_groups ORDER BY title, id")?;
    let groups = stmt
        .query_map([], group_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::test_pool;

    #[test]
    fn slug_validation() {
        assert!(is_valid_slug("test_slug-2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("has space"));
        assert!(!is_valid_slug("слаг"));
    }

    #[test]
    fn create_find_and_list() {
        let (_tmp, pool) = test_pool();
        let conn = pool.get().unwrap();
        let b = create(&conn, "Beta", "beta", "").unwrap();
        let a = create(&conn, "Alpha", "alpha", "first").unwrap();

        let found = find_by_slug(&conn, "alpha").unwrap().unwrap();
        assert_eq!(found.id, a);
        assert_eq!(found.description, "first");
        assert!(find_by_slug(&conn, "gamma").unwrap().is_none());
        assert!(exists(&conn, b).unwrap());
        assert!(!exists(&conn, 999).unwrap());

        let titles: Vec<String> = list_all(&conn).unwrap().into_iter().map(|g| g.title).collect();
        assert_eq!(titles, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn duplicate_slug_is_rejected() {
        let (_tmp, pool) = test_pool();
        let conn = pool.get().unwrap();
        create(&conn, "One", "same", "").unwrap();
        assert!(create(&conn, "Two", "same", "").is_err());
    }
}
