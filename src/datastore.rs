#[cfg(test)]
pub mod mock;
pub mod postfilters;
pub mod postgres;
pub mod structs;
pub mod tables;

use crate::datastore::structs::{
    Comment, CommentDetail, EditPost, Group, NewComment, NewPost, Post, PostDetail, PostRevision,
    User,
};
use crate::fault::Fallible;
use async_trait::async_trait;
use postfilters::PostFilters;
use uuid::Uuid;

#[async_trait]
/// The interface for storing and querying blog data.
pub trait Client: Clone {
    /// One page of posts matching the filters, newest first, with author and
    /// group attached, plus the total number of matches.
    async fn find_posts(
        &self,
        filters: PostFilters,
        limit: u32,
        offset: u64,
    ) -> Fallible<(Vec<PostDetail>, u64)>;
    async fn find_post(&self, author_id: Uuid, post_id: Uuid) -> Fallible<Option<PostDetail>>;
    async fn new_post(&self, new_post: NewPost) -> Fallible<PostDetail>;
    async fn update_post(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        edit: EditPost,
    ) -> Fallible<Option<PostRevision>>;
    /// Removes the post and its comments. Returns the removed post so the
    /// caller can clean up its image.
    async fn delete_post(&self, author_id: Uuid, post_id: Uuid) -> Fallible<Option<Post>>;
    async fn new_comment(&self, new_comment: NewComment) -> Fallible<Comment>;
    async fn list_comments(&self, post_id: Uuid) -> Fallible<Vec<CommentDetail>>;
    /// Records a follow edge. Rejects self-follows; duplicate edges collapse.
    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> Fallible<()>;
    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> Fallible<()>;
    /// Ids of every author this user follows.
    async fn following(&self, user_id: Uuid) -> Fallible<Vec<Uuid>>;
    async fn find_group(&self, slug: String) -> Fallible<Option<Group>>;
    async fn find_user(&self, username: String) -> Fallible<Option<User>>;
    async fn get_user(&self, user_id: Uuid) -> Fallible<Option<User>>;
}
