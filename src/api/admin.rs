use crate::api::State;
use crate::datastore::{postfilters, structs::PostDetail, Client};
use crate::fault::Fallible;
use actix_web::web;
use serde::Deserialize;
use uuid::Uuid;

pub fn configure<DS: Client + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/posts").route(web::get().to(list_all_posts::<DS>)));
}

/// Filters admins can pass in the query string. Kept flat so they fit a URL;
/// combined into datastore filters before execution.
#[derive(Default, Deserialize, Debug, Eq, PartialEq)]
pub struct PostQuery {
    pub author_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub text_contains: Option<String>,
    /// Maximum number of posts to return
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    100
}

impl PostQuery {
    pub fn into_datastore_filters(self) -> postfilters::PostFilters {
        postfilters::PostFilters {
            author_id: self.author_id,
            group_id: self.group_id,
            author_in: None,
            text_contains: self.text_contains,
        }
    }
}

// Admin endpoint. Serves raw rows, relations and all.
async fn list_all_posts<DS: Client>(
    state: web::Data<State<DS>>,
    query: web::Query<PostQuery>,
) -> Fallible<web::Json<Vec<PostDetail>>> {
    let query = query.into_inner();
    let limit = query.limit;
    let (posts, _total) = state
        .ds
        .find_posts(query.into_datastore_filters(), limit, 0)
        .await?;
    Ok(web::Json(posts))
}
