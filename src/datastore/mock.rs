use crate::datastore::{
    postfilters::PostFilters,
    structs::{
        Comment, CommentDetail, EditPost, Follow, Group, NewComment, NewPost, Post, PostDetail,
        PostRevision, User,
    },
};
use crate::fault::{Cause, Describe, Fallible};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::offset::Utc;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

type Store<T> = Arc<Mutex<Vec<T>>>;

/// A mock implementation of datastore::Client.
/// Same ordering and filter semantics as the Postgres store, in memory.
#[derive(Clone, Default, Debug)]
pub struct Client {
    posts: Store<Post>,
    users: Store<User>,
    groups: Store<Group>,
    comments: Store<Comment>,
    follows: Store<Follow>,
}

impl Client {
    pub fn set_posts(&mut self, posts: Vec<Post>) {
        self.posts = Arc::new(Mutex::new(posts));
    }

    pub fn set_users(&mut self, users: Vec<User>) {
        self.users = Arc::new(Mutex::new(users));
    }

    pub fn set_groups(&mut self, groups: Vec<Group>) {
        self.groups = Arc::new(Mutex::new(groups));
    }

    pub fn set_follows(&mut self, follows: Vec<Follow>) {
        self.follows = Arc::new(Mutex::new(follows));
    }

    fn detail(&self, post: Post) -> PostDetail {
        let author = self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == post.author_id)
            .cloned()
            .expect("post author missing from mock users");
        let group = post.group_id.map(|group_id| {
            self.groups
                .lock()
                .unwrap()
                .iter()
                .find(|g| g.id == group_id)
                .cloned()
                .expect("post group missing from mock groups")
        });
        PostDetail {
            post,
            author,
            group,
        }
    }
}

#[async_trait]
impl super::Client for Client {
    async fn find_posts(
        &self,
        filters: PostFilters,
        limit: u32,
        offset: u64,
    ) -> Fallible<(Vec<PostDetail>, u64)> {
        let mut matching: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.matches(&filters))
            .cloned()
            .collect();
        // Newest first, id breaks timestamp ties.
        matching.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|p| self.detail(p))
            .collect();
        Ok((page, total))
    }

    async fn find_post(&self, author_id: Uuid, post_id: Uuid) -> Fallible<Option<PostDetail>> {
        let post = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == post_id && p.author_id == author_id)
            .cloned();
        Ok(post.map(|p| self.detail(p)))
    }

    async fn new_post(&self, new_post: NewPost) -> Fallible<PostDetail> {
        let post = Post {
            id: Uuid::new_v4(),
            pub_date: Utc::now(),
            text: new_post.text,
            author_id: new_post.author_id,
            group_id: new_post.group_id,
            image: new_post.image,
        };
        self.posts.lock().unwrap().push(post.clone());
        Ok(self.detail(post))
    }

    async fn update_post(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        edit: EditPost,
    ) -> Fallible<Option<PostRevision>> {
        let mut posts = self.posts.lock().unwrap();
        let revision = posts
            .iter_mut()
            .find(|p| p.id == post_id && p.author_id == author_id)
            .map(|post| {
                let before = post.clone();
                post.text = edit.text.clone();
                post.group_id = edit.group_id;
                post.image = edit.image.clone();
                PostRevision {
                    before,
                    after: post.clone(),
                }
            });
        Ok(revision)
    }

    async fn delete_post(&self, author_id: Uuid, post_id: Uuid) -> Fallible<Option<Post>> {
        let mut posts = self.posts.lock().unwrap();
        let index = posts
            .iter()
            .position(|p| p.id == post_id && p.author_id == author_id);
        let removed = index.map(|i| posts.remove(i));
        if removed.is_some() {
            self.comments.lock().unwrap().retain(|c| c.post_id != post_id);
        }
        Ok(removed)
    }

    async fn new_comment(&self, new_comment: NewComment) -> Fallible<Comment> {
        let comment = Comment {
            id: Uuid::new_v4(),
            created: Utc::now(),
            text: new_comment.text,
            post_id: new_comment.post_id,
            author_id: new_comment.author_id,
        };
        self.comments.lock().unwrap().push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, post_id: Uuid) -> Fallible<Vec<CommentDetail>> {
        let mut matching: Vec<Comment> = self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        let users = self.users.lock().unwrap();
        Ok(matching
            .into_iter()
            .map(|comment| {
                let author = users
                    .iter()
                    .find(|u| u.id == comment.author_id)
                    .cloned()
                    .expect("comment author missing from mock users");
                CommentDetail { comment, author }
            })
            .collect())
    }

    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> Fallible<()> {
        if user_id == author_id {
            return Err(
                anyhow!("user {} tried to follow themselves", user_id).describe(
                    crate::fault::PublicError {
                        cause: Cause::InvalidInput,
                        text: "You cannot follow yourself",
                    },
                ),
            );
        }
        let mut follows = self.follows.lock().unwrap();
        let edge = Follow { user_id, author_id };
        if !follows.contains(&edge) {
            follows.push(edge);
        }
        Ok(())
    }

    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> Fallible<()> {
        self.follows
            .lock()
            .unwrap()
            .retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        Ok(())
    }

    async fn following(&self, user_id: Uuid) -> Fallible<Vec<Uuid>> {
        Ok(self
            .follows
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.user_id == user_id)
            .map(|f| f.author_id)
            .collect())
    }

    async fn find_group(&self, slug: String) -> Fallible<Option<Group>> {
        Ok(self
            .groups
            .lock()
            .unwrap()
            .iter()
            .find(|g| g.slug == slug)
            .cloned())
    }

    async fn find_user(&self, username: String) -> Fallible<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn get_user(&self, user_id: Uuid) -> Fallible<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .cloned())
    }
}

// These pin down the contract both Client implementations share.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastore::Client as _;

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            username: name.to_owned(),
        }
    }

    #[actix_rt::test]
    async fn test_self_follow_is_rejected() {
        let bob = user("bob");
        let mut ds = Client::default();
        ds.set_users(vec![bob.clone()]);

        let err = ds.follow(bob.id, bob.id).await.unwrap_err();
        assert_eq!(err.public.cause, Cause::InvalidInput);
        assert!(ds.following(bob.id).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_duplicate_follow_edges_collapse() {
        let alice = user("alice");
        let bob = user("bob");
        let mut ds = Client::default();
        ds.set_users(vec![alice.clone(), bob.clone()]);

        ds.follow(bob.id, alice.id).await.unwrap();
        ds.follow(bob.id, alice.id).await.unwrap();
        assert_eq!(ds.following(bob.id).await.unwrap(), vec![alice.id]);

        ds.unfollow(bob.id, alice.id).await.unwrap();
        assert!(ds.following(bob.id).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_deleting_a_post_takes_its_comments_with_it() {
        let alice = user("alice");
        let bob = user("bob");
        let mut ds = Client::default();
        ds.set_users(vec![alice.clone(), bob.clone()]);
        let detail = ds
            .new_post(NewPost {
                text: "soon gone".to_owned(),
                author_id: alice.id,
                group_id: None,
                image: Some("posts/gone.jpg".to_owned()),
            })
            .await
            .unwrap();
        let post_id = detail.post.id;
        ds.new_comment(NewComment {
            text: "nice post".to_owned(),
            post_id,
            author_id: bob.id,
        })
        .await
        .unwrap();

        let removed = ds.delete_post(alice.id, post_id).await.unwrap().unwrap();
        assert_eq!(removed.image.as_deref(), Some("posts/gone.jpg"));
        assert!(ds.list_comments(post_id).await.unwrap().is_empty());
        assert!(ds.find_post(alice.id, post_id).await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn test_comments_come_back_oldest_first() {
        let alice = user("alice");
        let bob = user("bob");
        let mut ds = Client::default();
        ds.set_users(vec![alice.clone(), bob.clone()]);
        let detail = ds
            .new_post(NewPost {
                text: "discuss".to_owned(),
                author_id: alice.id,
                group_id: None,
                image: None,
            })
            .await
            .unwrap();
        for text in &["first!", "second", "third"] {
            ds.new_comment(NewComment {
                text: (*text).to_owned(),
                post_id: detail.post.id,
                author_id: bob.id,
            })
            .await
            .unwrap();
        }

        let comments = ds.list_comments(detail.post.id).await.unwrap();
        let texts: Vec<_> = comments.iter().map(|c| c.comment.text.as_str()).collect();
        assert_eq!(texts, vec!["first!", "second", "third"]);
        assert!(comments.iter().all(|c| c.author.username == "bob"));
    }

    #[actix_rt::test]
    async fn test_only_the_author_can_edit() {
        let alice = user("alice");
        let mallory = user("mallory");
        let mut ds = Client::default();
        ds.set_users(vec![alice.clone(), mallory.clone()]);
        let detail = ds
            .new_post(NewPost {
                text: "original".to_owned(),
                author_id: alice.id,
                group_id: None,
                image: None,
            })
            .await
            .unwrap();

        let edit = EditPost {
            text: "defaced".to_owned(),
            group_id: None,
            image: None,
        };
        let denied = ds
            .update_post(mallory.id, detail.post.id, edit.clone())
            .await
            .unwrap();
        assert!(denied.is_none());

        let revision = ds
            .update_post(alice.id, detail.post.id, edit)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(revision.before.text, "original");
        assert_eq!(revision.after.text, "defaced");
        // The publication date never moves.
        assert_eq!(revision.before.pub_date, revision.after.pub_date);
    }
}
