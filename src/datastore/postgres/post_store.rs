use crate::datastore::{
    postfilters::PostFilters,
    postgres::{
        errors::{BlockingResp, DbPoolResult},
        PostgresStore,
    },
    structs::{
        Comment, CommentDetail, EditPost, Follow, Group, NewComment, NewPost, Post, PostDetail,
        PostRevision, User,
    },
    tables::{comments, follows, groups, posts, users},
    Client,
};
use crate::fault::{Cause, Describe, Fallible, Fault, PublicError};
use actix_web::web::block;
use anyhow::anyhow;
use async_trait::async_trait;
use diesel::{
    dsl::count_star,
    expression::BoxableExpression,
    pg::Pg,
    query_dsl::{QueryDsl, RunQueryDsl},
    sql_types::Bool,
    Connection, ExpressionMethods, NullableExpressionMethods, OptionalExtension,
    TextExpressionMethods,
};
use uuid::Uuid;

#[async_trait]
impl Client for PostgresStore {
    async fn find_posts(
        &self,
        filters: PostFilters,
        limit: u32,
        offset: u64,
    ) -> Fallible<(Vec<PostDetail>, u64)> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            // Total count first, so callers can do their page math.
            let mut count_query = posts::table.select(count_star()).into_boxed();
            for filter in filters.as_sql_where() {
                count_query = count_query.filter(filter);
            }
            let total: i64 = count_query.get_result(&conn)?;

            // Author and group come back in the same query as the posts.
            // Listings must never fetch per row.
            let mut query = posts::table
                .inner_join(users::table)
                .left_join(groups::table)
                .select((
                    posts::all_columns,
                    users::all_columns,
                    groups::all_columns.nullable(),
                ))
                .into_boxed();
            if let Some(author_id) = filters.author_id {
                query = query.filter(posts::author_id.eq(author_id));
            }
            if let Some(group_id) = filters.group_id {
                query = query.filter(posts::group_id.eq(group_id));
            }
            if let Some(authors) = filters.author_in {
                query = query.filter(posts::author_id.eq_any(authors));
            }
            if let Some(substring) = filters.text_contains {
                query = query.filter(posts::text.like(format!("%{}%", substring)));
            }
            let rows: Vec<(Post, User, Option<Group>)> = query
                .order((posts::pub_date.desc(), posts::id.desc()))
                .limit(i64::from(limit))
                .offset(offset as i64)
                .load(&conn)?;

            let details = rows.into_iter().map(PostDetail::from).collect();
            Ok((details, total as u64))
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn find_post(&self, author_id: Uuid, post_id: Uuid) -> Fallible<Option<PostDetail>> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            let target: Option<(Post, User, Option<Group>)> = posts::table
                .inner_join(users::table)
                .left_join(groups::table)
                .select((
                    posts::all_columns,
                    users::all_columns,
                    groups::all_columns.nullable(),
                ))
                .filter(posts::id.eq(post_id))
                .filter(posts::author_id.eq(author_id))
                .first(&conn)
                .optional()?;
            Ok(target.map(PostDetail::from))
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn new_post(&self, new_post: NewPost) -> Fallible<PostDetail> {
        let conn = self.pool.get()?;
        let detail = block(move || {
            conn.transaction::<_, Fault, _>(|| {
                // Insert the new post
                let post: Post = diesel::insert_into(posts::table)
                    .values(&new_post)
                    .get_result(&conn)?;
                let author: User = users::table.find(post.author_id).first(&conn)?;
                let group: Option<Group> = match post.group_id {
                    Some(group_id) => groups::table.find(group_id).first(&conn).optional()?,
                    None => None,
                };
                Ok(PostDetail {
                    post,
                    author,
                    group,
                })
            })
        })
        .await
        .to_resp()?;
        Ok(detail)
    }

    async fn update_post(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        edit: EditPost,
    ) -> Fallible<Option<PostRevision>> {
        let conn = self.pool.get()?;
        let revision = block(move || {
            conn.transaction::<_, Fault, _>(|| {
                // Only the author may edit, so the lookup is author-scoped.
                let before: Option<Post> = posts::table
                    .find(post_id)
                    .filter(posts::author_id.eq(author_id))
                    .first(&conn)
                    .optional()?;

                guard!(let Some(before) = before else {
                    return Ok(None);
                });

                let after: Post = diesel::update(posts::table.find(post_id))
                    .set(&edit)
                    .get_result(&conn)?;

                Ok(Some(PostRevision { before, after }))
            })
        })
        .await
        .to_resp()?;
        Ok(revision)
    }

    async fn delete_post(&self, author_id: Uuid, post_id: Uuid) -> Fallible<Option<Post>> {
        let conn = self.pool.get()?;
        let post = block(move || {
            conn.transaction::<_, Fault, _>(|| {
                let target: Option<Post> = posts::table
                    .find(post_id)
                    .filter(posts::author_id.eq(author_id))
                    .first(&conn)
                    .optional()?;

                guard!(let Some(target) = target else {
                    return Ok(None);
                });

                // Comments go with their post.
                diesel::delete(comments::table.filter(comments::post_id.eq(post_id)))
                    .execute(&conn)?;
                diesel::delete(posts::table.find(post_id)).execute(&conn)?;

                Ok(Some(target))
            })
        })
        .await
        .to_resp()?;
        Ok(post)
    }

    async fn new_comment(&self, new_comment: NewComment) -> Fallible<Comment> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            let comment: Comment = diesel::insert_into(comments::table)
                .values(&new_comment)
                .get_result(&conn)?;
            Ok(comment)
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn list_comments(&self, post_id: Uuid) -> Fallible<Vec<CommentDetail>> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            let rows: Vec<(Comment, User)> = comments::table
                .inner_join(users::table)
                .filter(comments::post_id.eq(post_id))
                .order((comments::created.asc(), comments::id.asc()))
                .load(&conn)?;
            Ok(rows.into_iter().map(CommentDetail::from).collect())
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn follow(&self, user_id: Uuid, author_id: Uuid) -> Fallible<()> {
        if user_id == author_id {
            return Err(
                anyhow!("user {} tried to follow themselves", user_id).describe(PublicError {
                    cause: Cause::InvalidInput,
                    text: "You cannot follow yourself",
                }),
            );
        }
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            // Re-following is a no-op, never a second edge.
            diesel::insert_into(follows::table)
                .values(&Follow { user_id, author_id })
                .on_conflict_do_nothing()
                .execute(&conn)?;
            Ok(())
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn unfollow(&self, user_id: Uuid, author_id: Uuid) -> Fallible<()> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            diesel::delete(
                follows::table
                    .filter(follows::user_id.eq(user_id))
                    .filter(follows::author_id.eq(author_id)),
            )
            .execute(&conn)?;
            Ok(())
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn following(&self, user_id: Uuid) -> Fallible<Vec<Uuid>> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            let authors: Vec<Uuid> = follows::table
                .filter(follows::user_id.eq(user_id))
                .select(follows::author_id)
                .get_results(&conn)?;
            Ok(authors)
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn find_group(&self, slug: String) -> Fallible<Option<Group>> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            let group: Option<Group> = groups::table
                .filter(groups::slug.eq(slug))
                .first(&conn)
                .optional()?;
            Ok(group)
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn find_user(&self, username: String) -> Fallible<Option<User>> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            let user: Option<User> = users::table
                .filter(users::username.eq(username))
                .first(&conn)
                .optional()?;
            Ok(user)
        })
        .await;
        Ok(query_result.to_resp()?)
    }

    async fn get_user(&self, user_id: Uuid) -> Fallible<Option<User>> {
        let conn = self.pool.get()?;
        let query_result: DbPoolResult<_> = block(move || {
            let user: Option<User> = users::table.find(user_id).first(&conn).optional()?;
            Ok(user)
        })
        .await;
        Ok(query_result.to_resp()?)
    }
}

impl PostFilters {
    pub fn as_sql_where(
        &self,
    ) -> Vec<Box<dyn BoxableExpression<posts::table, Pg, SqlType = Bool>>> {
        let mut wheres: Vec<Box<dyn BoxableExpression<posts::table, Pg, SqlType = Bool>>> =
            Vec::new();
        if let Some(author_id) = self.author_id {
            wheres.push(Box::new(posts::author_id.eq(author_id)))
        }
        if let Some(group_id) = self.group_id {
            wheres.push(Box::new(posts::group_id.eq(group_id)))
        }
        if let Some(authors) = &self.author_in {
            wheres.push(Box::new(posts::author_id.eq_any(authors.clone())))
        }
        if let Some(substring) = &self.text_contains {
            wheres.push(Box::new(posts::text.like(format!("%{}%", substring))))
        }
        wheres
    }
}
