use crate::datastore::postfilters::PostFilters;
use crate::datastore::tables::{comments, follows, groups, posts, users};
use chrono::{offset::Utc, DateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An author (or reader) of the site. Accounts are managed elsewhere;
/// this datastore only ever reads them.
#[derive(Queryable, Identifiable, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct User {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub username: String,
}

/// A named collection of posts, addressed by its slug in URLs.
#[derive(Queryable, Identifiable, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Group {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A post from an author.
#[derive(
    Queryable, Identifiable, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, Associations,
)]
#[belongs_to(User, foreign_key = "author_id")]
pub struct Post {
    pub id: Uuid,
    /// Assigned once at creation, never updated.
    pub pub_date: DateTime<Utc>,
    pub text: String,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    /// Relative path of the attached image inside the media root, if any.
    pub image: Option<String>,
}

impl Post {
    /// Does this post match all specified filters?
    pub fn matches(&self, filters: &PostFilters) -> bool {
        if let Some(author_id) = filters.author_id {
            if author_id != self.author_id {
                return false;
            }
        }
        if let Some(group_id) = filters.group_id {
            if self.group_id != Some(group_id) {
                return false;
            }
        }
        if let Some(authors) = &filters.author_in {
            if !authors.contains(&self.author_id) {
                return false;
            }
        }
        if let Some(substring) = &filters.text_contains {
            if !self.text.contains(substring) {
                return false;
            }
        }
        true
    }
}

/// Parameters for the database statement which inserts new posts.
#[derive(Insertable)]
#[table_name = "posts"]
pub struct NewPost {
    pub text: String,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

/// A full replacement of a post's editable fields, like saving an edit form.
/// `treat_none_as_null` so clearing the group or image actually clears it.
#[derive(AsChangeset, Clone, Debug)]
#[table_name = "posts"]
#[changeset_options(treat_none_as_null = "true")]
pub struct EditPost {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

/// A reader's comment on a post. Deleted along with the post.
#[derive(Queryable, Identifiable, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Comment {
    pub id: Uuid,
    pub created: DateTime<Utc>,
    pub text: String,
    pub post_id: Uuid,
    pub author_id: Uuid,
}

/// Parameters for the database statement which inserts new comments.
#[derive(Insertable)]
#[table_name = "comments"]
pub struct NewComment {
    pub text: String,
    pub post_id: Uuid,
    pub author_id: Uuid,
}

/// A directed edge: `user_id` wants `author_id`'s posts in their feed.
/// One edge per (user, author) pair, and never user == author.
#[derive(Queryable, Insertable, Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[table_name = "follows"]
pub struct Follow {
    pub user_id: Uuid,
    pub author_id: Uuid,
}

/// A post with its author and group attached, all fetched in the same
/// retrieval pass so listings never fetch per row.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PostDetail {
    pub post: Post,
    pub author: User,
    pub group: Option<Group>,
}

impl From<(Post, User, Option<Group>)> for PostDetail {
    fn from((post, author, group): (Post, User, Option<Group>)) -> Self {
        Self {
            post,
            author,
            group,
        }
    }
}

/// A comment with its author attached.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CommentDetail {
    pub comment: Comment,
    pub author: User,
}

impl From<(Comment, User)> for CommentDetail {
    fn from((comment, author): (Comment, User)) -> Self {
        Self { comment, author }
    }
}

/// The state of a post before and after an edit. The caller compares the two
/// image fields to decide whether a replaced image file needs removing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostRevision {
    pub before: Post,
    pub after: Post,
}
