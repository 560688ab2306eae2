//! Built-in scenarios for the posts/users API
//!
//! Negative-path ids (100000, 1000) are deliberately out of range so the
//! entity is guaranteed absent. Ids of entities a scenario creates are
//! always captured from its own creation response.

use serde_json::json;

use crate::common::{Error, Result};
use crate::scenario::{Lifecycle, Scenario, Step};

/// Write route guarded by the API: readable by anyone, writable with a token
pub const GUARDED_POSTS_PATH: &str = "/664/posts";

/// Post id that never exists in the target collection
pub const MISSING_UPDATE_ID: i64 = 100000;
/// Post id that never exists in the target collection
pub const MISSING_DELETE_ID: i64 = 1000;

/// Every built-in scenario, in execution order
pub fn builtin() -> Vec<Scenario> {
    vec![
        get_all_posts(),
        first_ten_posts(),
        lookup_posts_by_id(),
        create_post_unauthorized(),
        create_post_with_token(),
        create_post_entity(),
        update_missing_post(),
        create_and_update_post(),
        delete_missing_post(),
        post_lifecycle(),
    ]
}

/// Pick scenarios by 1-based position or name
///
/// An empty filter list selects everything. A filter matches a scenario
/// when it equals its position, or its name case-insensitively.
pub fn select(scenarios: Vec<Scenario>, filters: &[String]) -> Result<Vec<Scenario>> {
    if filters.is_empty() {
        return Ok(scenarios);
    }

    for filter in filters {
        let known = scenarios
            .iter()
            .enumerate()
            .any(|(i, s)| matches_filter(i + 1, s, filter));
        if !known {
            return Err(Error::Config(format!(
                "No built-in scenario matches '{}'. Use 'posts-e2e list' to see them",
                filter
            )));
        }
    }

    Ok(scenarios
        .into_iter()
        .enumerate()
        .filter(|(i, s)| filters.iter().any(|f| matches_filter(i + 1, s, f)))
        .map(|(_, s)| s)
        .collect())
}

fn matches_filter(position: usize, scenario: &Scenario, filter: &str) -> bool {
    let filter = filter.trim();
    filter.parse::<usize>().map(|n| n == position).unwrap_or(false)
        || scenario.name.eq_ignore_ascii_case(filter)
}

fn collection_is_seeded() -> Step {
    Step::get("collection holds posts 55 and 60 and at least 10 entries", "/posts")
        .expect_status(200)
        .expect_min_len(10)
        .expect_ids(&[55, 60])
        .as_precondition()
}

pub fn get_all_posts() -> Scenario {
    Scenario::new(
        "get-all-posts",
        "Get all posts. Verify status code and content type",
    )
    .step(
        Step::get("list posts", "/posts")
            .expect_status(200)
            .expect_content_type("application/json"),
    )
}

pub fn first_ten_posts() -> Scenario {
    Scenario::new(
        "first-ten-posts",
        "Get only the first 10 posts. Verify that exactly 10 are returned",
    )
    .step(collection_is_seeded())
    .step(
        Step::get("take first 10 posts", "/posts")
            .expect_status(200)
            .expect_first_n(10),
    )
}

pub fn lookup_posts_by_id() -> Scenario {
    Scenario::new(
        "lookup-posts-by-id",
        "Find posts 55 and 60 in the collection. Verify their id values",
    )
    .step(collection_is_seeded())
    .step(
        Step::get("find posts 55 and 60", "/posts")
            .expect_status(200)
            .expect_ids(&[55, 60]),
    )
}

pub fn create_post_unauthorized() -> Scenario {
    Scenario::new(
        "create-post-unauthorized",
        "Create a post on the guarded route without a token. Expect 401",
    )
    .step(
        Step::post(
            "create without token",
            GUARDED_POSTS_PATH,
            json!({"title": "EXAM PART 2", "body": "TEST"}),
        )
        .surface_status()
        .expect_status(401),
    )
}

pub fn create_post_with_token() -> Scenario {
    Scenario::new(
        "create-post-with-token",
        "Register a user, then create a post on the guarded route with its access token",
    )
    .step(
        Step::post(
            "register user",
            "/register",
            json!({"email": "{{user.email}}", "password": "{{user.password}}"}),
        )
        .expect_status(201)
        .expect_non_empty("/accessToken")
        .capture_required("access_token", "/accessToken"),
    )
    .step(
        Step::post(
            "create with bearer token",
            GUARDED_POSTS_PATH,
            json!({"title": "Post by Viktoria", "body": "New Post"}),
        )
        .header("Authorization", "Bearer {{access_token}}")
        .expect_status(201),
    )
}

pub fn create_post_entity() -> Scenario {
    Scenario::new(
        "create-post-entity",
        "Create a post entity with a JSON body. Verify the echoed fields",
    )
    .step(
        Step::post(
            "create post",
            "/posts",
            json!({"title": "Post by Viktoria", "body": "Post entity", "userId": 1}),
        )
        .expect_status(201)
        .expect_field("/title", json!("Post by Viktoria"))
        .expect_field("/body", json!("Post entity"))
        .expect_field("/userId", json!(1))
        .establishes(Lifecycle::Created),
    )
}

pub fn update_missing_post() -> Scenario {
    Scenario::new(
        "update-missing-post",
        "Update a post that does not exist. Expect 404",
    )
    .step(
        Step::put(
            "update missing post",
            format!("/posts/{}", MISSING_UPDATE_ID),
            json!({"title": "Updated Title", "body": "Updated content.", "userId": 1}),
        )
        .surface_status()
        .expect_status(404),
    )
}

pub fn create_and_update_post() -> Scenario {
    Scenario::new(
        "create-and-update-post",
        "Create a post, update it, and verify the update kept userId",
    )
    .step(
        Step::post(
            "create post",
            "/posts",
            json!({"title": "Post by Viktoria", "body": "Viktoria entity post", "userId": 1}),
        )
        .expect_status(201)
        .expect_field("/title", json!("Post by Viktoria"))
        .expect_field_contains("/body", "Viktoria entity post")
        .expect_field("/userId", json!(1))
        .capture_required("post_id", "/id")
        .establishes(Lifecycle::Created),
    )
    .step(
        Step::put(
            "update created post",
            "/posts/{{post_id}}",
            json!({"title": "Updated by Viktoria", "body": "Updated test post entity", "userId": 1}),
        )
        .expect_status(200)
        .expect_field("/title", json!("Updated by Viktoria"))
        .expect_field_contains("/body", "Updated test post entity")
        .expect_field("/userId", json!(1))
        .establishes(Lifecycle::Updated),
    )
}

pub fn delete_missing_post() -> Scenario {
    Scenario::new(
        "delete-missing-post",
        "Delete a post that does not exist. Expect 404",
    )
    .step(
        Step::delete("delete missing post", format!("/posts/{}", MISSING_DELETE_ID))
            .surface_status()
            .expect_status(404),
    )
}

pub fn post_lifecycle() -> Scenario {
    Scenario::new(
        "post-lifecycle",
        "Create, update and delete a post, then verify it is gone",
    )
    .step(
        Step::post(
            "create post",
            "/posts",
            json!({"title": "Post by Viktoria", "body": "Test post entity.", "userId": 1}),
        )
        .expect_status(201)
        .capture_required("post_id", "/id")
        .establishes(Lifecycle::Created),
    )
    .step(
        Step::put(
            "update created post",
            "/posts/{{post_id}}",
            json!({"title": "Updated Test Post", "body": "This is an updated test post entity.", "userId": 1}),
        )
        .expect_status(200)
        .expect_field("/title", json!("Updated Test Post"))
        .expect_field("/body", json!("This is an updated test post entity."))
        .expect_field("/userId", json!(1))
        .establishes(Lifecycle::Updated),
    )
    .step(
        Step::delete("delete created post", "/posts/{{post_id}}")
            .surface_status()
            .expect_status(200)
            .establishes(Lifecycle::Deleted),
    )
    .step(
        Step::get("fetch deleted post", "/posts/{{post_id}}")
            .surface_status()
            .expect_status(404)
            .establishes(Lifecycle::ConfirmedAbsent),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StatusPolicy;

    #[test]
    fn test_catalog_is_valid() {
        let scenarios = builtin();
        assert_eq!(scenarios.len(), 10);
        for scenario in &scenarios {
            scenario.validate().unwrap();
        }
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<String> = builtin().into_iter().map(|s| s.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 10);
    }

    #[test]
    fn test_rejections_surface_status() {
        for scenario in builtin() {
            for step in &scenario.steps {
                if step.expect.status.map(|s| s >= 400).unwrap_or(false) {
                    assert_eq!(step.status_policy(), StatusPolicy::Surface, "{}", step.name);
                }
            }
        }
    }

    #[test]
    fn test_created_ids_are_never_literals() {
        let lifecycle = post_lifecycle();
        assert_eq!(lifecycle.steps[0].capture[0].name, "post_id");
        for step in &lifecycle.steps[1..] {
            assert_eq!(step.path, "/posts/{{post_id}}");
        }
    }

    #[test]
    fn test_select_by_position_and_name() {
        let picked = select(builtin(), &["1".to_string(), "Post-Lifecycle".to_string()]).unwrap();
        let names: Vec<&str> = picked.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["get-all-posts", "post-lifecycle"]);

        assert_eq!(select(builtin(), &[]).unwrap().len(), 10);
    }

    #[test]
    fn test_select_unknown_filter() {
        assert!(matches!(
            select(builtin(), &["42".to_string()]),
            Err(Error::Config(_))
        ));
    }
}
