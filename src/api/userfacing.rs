//! For every listing surface the site has (index, group page, author profile,
//! follow feed) there's a read handler here, plus the write path for posts,
//! comments and follow edges. Response structs flatten the datastore rows and
//! drop anything a reader has no business seeing.
use crate::api::{observe, AuthorPost, CoerceColl, State};
use crate::datastore::structs::{CommentDetail, EditPost, NewComment, NewPost, Post, PostDetail};
use crate::datastore::Client;
use crate::fault::{Cause, Describe, Fallible, Fault, PublicError};
use crate::feed::{page::Page, Scope};
use actix_web::{web, HttpResponse};
use anyhow::anyhow;
use chrono::{offset::Utc, DateTime};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

pub fn configure<DS: Client + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/posts").route(web::get().to(index::<DS>)))
        .service(web::resource("/group/{slug}").route(web::get().to(group_posts::<DS>)))
        .service(web::resource("/profile/{username}").route(web::get().to(profile::<DS>)))
        .service(web::resource("/feed/{user_id}").route(web::get().to(follow_feed::<DS>)))
        .service(
            web::scope("/{user_id}/follow")
                .route("/{username}", web::post().to(follow::<DS>))
                .route("/{username}", web::delete().to(unfollow::<DS>)),
        )
        .service(
            web::scope("/{user_id}/posts")
                .route("", web::post().to(write_post::<DS>))
                .route("/{post_id}", web::get().to(get_post::<DS>))
                .route("/{post_id}", web::put().to(edit_post::<DS>))
                .route("/{post_id}", web::delete().to(delete_post::<DS>))
                .route("/{post_id}/comments", web::get().to(list_comments::<DS>))
                .route("/{post_id}/comments", web::post().to(write_comment::<DS>)),
        );
}

/// The ?page= query parameter. Absent means the first page.
#[derive(Deserialize, Debug)]
pub struct PageQuery {
    pub page: Option<u32>,
}

impl PageQuery {
    fn number(&self) -> u32 {
        self.page.unwrap_or(1)
    }
}

/// An author as embedded in listings.
#[derive(Serialize, Deserialize, Eq, PartialEq, Debug)]
pub struct AuthorView {
    pub id: Uuid,
    pub username: String,
}

/// A group as embedded in listings. The slug is its public address;
/// internal ids stay internal.
#[derive(Serialize, Deserialize, Eq, PartialEq, Debug)]
pub struct GroupView {
    pub title: String,
    pub slug: String,
}

/// One post as a listing serves it: flattened, author and group embedded.
#[derive(Serialize, Deserialize, Eq, PartialEq, Debug)]
pub struct FeedItem {
    pub id: Uuid,
    pub pub_date: DateTime<Utc>,
    pub text: String,
    pub image: Option<String>,
    pub author: AuthorView,
    pub group: Option<GroupView>,
}

impl From<PostDetail> for FeedItem {
    fn from(detail: PostDetail) -> Self {
        Self {
            id: detail.post.id,
            pub_date: detail.post.pub_date,
            text: detail.post.text,
            image: detail.post.image,
            author: AuthorView {
                id: detail.author.id,
                username: detail.author.username,
            },
            group: detail.group.map(|g| GroupView {
                title: g.title,
                slug: g.slug,
            }),
        }
    }
}

/// A bare post, without its relations. Write-path responses use this.
#[derive(Serialize, Deserialize, Eq, PartialEq, Debug)]
pub struct PostView {
    pub id: Uuid,
    pub pub_date: DateTime<Utc>,
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            pub_date: post.pub_date,
            text: post.text,
            group_id: post.group_id,
            image: post.image,
        }
    }
}

#[derive(Serialize, Deserialize, Eq, PartialEq, Debug)]
pub struct CommentView {
    pub id: Uuid,
    pub created: DateTime<Utc>,
    pub text: String,
    pub author: AuthorView,
}

impl From<CommentDetail> for CommentView {
    fn from(detail: CommentDetail) -> Self {
        Self {
            id: detail.comment.id,
            created: detail.comment.created,
            text: detail.comment.text,
            author: AuthorView {
                id: detail.author.id,
                username: detail.author.username,
            },
        }
    }
}

/// A post with its comment thread, as the post page shows it.
#[derive(Serialize, Deserialize, Eq, PartialEq, Debug)]
pub struct PostPage {
    pub post: FeedItem,
    pub comments: Vec<CommentView>,
}

// The four listing surfaces, all backed by the same feed assembler.

async fn index<DS: Client>(
    state: web::Data<State<DS>>,
    query: web::Query<PageQuery>,
) -> Fallible<web::Json<Page<FeedItem>>> {
    observe("index", || async {
        let page = state.feed.get_page(Scope::All, query.number()).await?;
        Ok(web::Json(page.map(FeedItem::from)))
    })
    .await
}

async fn group_posts<DS: Client>(
    state: web::Data<State<DS>>,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Fallible<web::Json<Page<FeedItem>>> {
    observe("group_posts", || async {
        let scope = Scope::ByGroup(slug.clone());
        let page = state.feed.get_page(scope, query.number()).await?;
        Ok(web::Json(page.map(FeedItem::from)))
    })
    .await
}

async fn profile<DS: Client>(
    state: web::Data<State<DS>>,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Fallible<web::Json<Page<FeedItem>>> {
    observe("profile", || async {
        let scope = Scope::ByAuthor(username.clone());
        let page = state.feed.get_page(scope, query.number()).await?;
        Ok(web::Json(page.map(FeedItem::from)))
    })
    .await
}

async fn follow_feed<DS: Client>(
    state: web::Data<State<DS>>,
    user_id: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> Fallible<web::Json<Page<FeedItem>>> {
    observe("follow_feed", || async {
        let scope = Scope::FollowedBy(*user_id);
        let page = state.feed.get_page(scope, query.number()).await?;
        Ok(web::Json(page.map(FeedItem::from)))
    })
    .await
}

#[derive(Serialize, Deserialize)]
pub struct WritePostBody {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

// Insert a post into the datastore
async fn write_post<DS: Client>(
    state: web::Data<State<DS>>,
    user_id: web::Path<Uuid>,
    body: web::Json<WritePostBody>,
) -> Fallible<web::Json<FeedItem>> {
    observe("write_post", || async {
        let new_post = NewPost {
            text: body.text.clone(),
            author_id: *user_id,
            group_id: body.group_id,
            image: body.image.clone(),
        };
        let detail = state.ds.new_post(new_post).await?;
        Ok(web::Json(detail.into()))
    })
    .await
}

async fn get_post<DS: Client>(
    state: web::Data<State<DS>>,
    path: web::Path<AuthorPost>,
) -> Fallible<web::Json<PostPage>> {
    observe("get_post", || async {
        let detail = state
            .ds
            .find_post(path.user_id, path.post_id)
            .await?
            .ok_or_else(post_not_found)?;
        let comments = state.ds.list_comments(path.post_id).await?.coerce_into();
        Ok(web::Json(PostPage {
            post: detail.into(),
            comments,
        }))
    })
    .await
}

#[derive(Serialize, Deserialize)]
pub struct EditPostBody {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

// Replace a post's editable fields. Only the post's author can do this; for
// anyone else the post simply isn't there to edit.
async fn edit_post<DS: Client>(
    state: web::Data<State<DS>>,
    path: web::Path<AuthorPost>,
    body: web::Json<EditPostBody>,
) -> Fallible<web::Json<PostView>> {
    observe("edit_post", || async {
        let edit = EditPost {
            text: body.text.clone(),
            group_id: body.group_id,
            image: body.image.clone(),
        };
        let revision = state
            .ds
            .update_post(path.user_id, path.post_id, edit)
            .await?
            .ok_or_else(post_not_found)?;

        // The row has committed; a replaced image file is now orphaned.
        if let Some(old_image) = &revision.before.image {
            if revision.after.image.as_ref() != Some(old_image) {
                if let Err(err) = state.media.remove(old_image) {
                    warn!(image = &old_image[..], "couldn't remove replaced image: {}", err);
                }
            }
        }
        Ok(web::Json(revision.after.into()))
    })
    .await
}

async fn delete_post<DS: Client>(
    state: web::Data<State<DS>>,
    path: web::Path<AuthorPost>,
) -> Fallible<web::Json<Option<PostView>>> {
    observe("delete_post", || async {
        let deleted = state.ds.delete_post(path.user_id, path.post_id).await?;
        if let Some(image) = deleted.as_ref().and_then(|post| post.image.as_ref()) {
            if let Err(err) = state.media.remove(image) {
                warn!(image = &image[..], "couldn't remove deleted post's image: {}", err);
            }
        }
        Ok(web::Json(deleted.map(PostView::from)))
    })
    .await
}

async fn list_comments<DS: Client>(
    state: web::Data<State<DS>>,
    path: web::Path<AuthorPost>,
) -> Fallible<web::Json<Vec<CommentView>>> {
    observe("list_comments", || async {
        // The path names the post's author; a mismatch reads as no post at all.
        state
            .ds
            .find_post(path.user_id, path.post_id)
            .await?
            .ok_or_else(post_not_found)?;
        let comments = state.ds.list_comments(path.post_id).await?.coerce_into();
        Ok(web::Json(comments))
    })
    .await
}

#[derive(Serialize, Deserialize)]
pub struct WriteCommentBody {
    pub text: String,
    /// The commenting reader, supplied by the hosting request pipeline.
    pub author_id: Uuid,
}

async fn write_comment<DS: Client>(
    state: web::Data<State<DS>>,
    path: web::Path<AuthorPost>,
    body: web::Json<WriteCommentBody>,
) -> Fallible<web::Json<CommentView>> {
    observe("write_comment", || async {
        state
            .ds
            .find_post(path.user_id, path.post_id)
            .await?
            .ok_or_else(post_not_found)?;
        let author = author_view(state.get_ref(), body.author_id).await?;
        let comment = state
            .ds
            .new_comment(NewComment {
                text: body.text.clone(),
                post_id: path.post_id,
                author_id: body.author_id,
            })
            .await?;
        Ok(web::Json(CommentView {
            id: comment.id,
            created: comment.created,
            text: comment.text,
            author,
        }))
    })
    .await
}

async fn follow<DS: Client>(
    state: web::Data<State<DS>>,
    path: web::Path<(Uuid, String)>,
) -> Fallible<HttpResponse> {
    observe("follow", || async {
        let author = resolve_username(state.get_ref(), path.1.clone()).await?;
        state.ds.follow(path.0.0, author.id).await?;
        Ok(HttpResponse::NoContent().finish())
    })
    .await
}

async fn unfollow<DS: Client>(
    state: web::Data<State<DS>>,
    path: web::Path<(Uuid, String)>,
) -> Fallible<HttpResponse> {
    observe("unfollow", || async {
        let author = resolve_username(state.get_ref(), path.1.clone()).await?;
        state.ds.unfollow(path.0.0, author.id).await?;
        Ok(HttpResponse::NoContent().finish())
    })
    .await
}

async fn resolve_username<DS: Client>(
    state: &State<DS>,
    username: String,
) -> Fallible<crate::datastore::structs::User> {
    state.ds.find_user(username.clone()).await?.ok_or_else(|| {
        anyhow!("no user named {:?}", username).describe(PublicError {
            cause: Cause::NotFound,
            text: "No such user",
        })
    })
}

async fn author_view<DS: Client>(state: &State<DS>, user_id: Uuid) -> Fallible<AuthorView> {
    let user = state.ds.get_user(user_id).await?.ok_or_else(|| {
        anyhow!("no user with id {}", user_id).describe(PublicError {
            cause: Cause::NotFound,
            text: "No such user",
        })
    })?;
    Ok(AuthorView {
        id: user.id,
        username: user.username,
    })
}

fn post_not_found() -> Fault {
    anyhow!("no post with that id under that author").describe(PublicError {
        cause: Cause::NotFound,
        text: "No such post",
    })
}
