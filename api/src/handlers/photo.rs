//! Photo routes: action descriptors plus the protected handlers behind them.

use async_trait::async_trait;
use authz::{Entity, EntityGraph};
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    gate::{AuthorizedHandler, RequestContext},
    middleware_hooks::Identity,
    models::{UploadPhotoResponse, ViewPhotoResponse},
    schema::{self, ACCOUNT_ATTR, PHOTO_TYPE},
    store::PhotoStore,
};

/// Id used for a photo that does not exist yet.
pub const UPLOAD_PLACEHOLDER_ID: &str = "pending";

/// The principal's user entity, referencing the user's own account.
fn principal_entity(identity: &Identity) -> Entity {
    Entity::new(schema::user_uid(&identity.user_id))
        .with_attr(ACCOUNT_ATTR, schema::account_uid(&identity.account_id))
}

/// POST /api/v1/photo/upload
///
/// The photo is not created yet, so the resource is a placeholder owned by
/// the caller's own account.
#[derive(Debug, Clone, Default)]
pub struct UploadPhoto;

#[async_trait]
impl AuthorizedHandler for UploadPhoto {
    fn action(&self, _ctx: &RequestContext) -> String {
        "UploadPhoto".to_string()
    }

    fn resource(&self, _ctx: &RequestContext) -> (String, String) {
        (PHOTO_TYPE.to_string(), UPLOAD_PLACEHOLDER_ID.to_string())
    }

    async fn entities(&self, ctx: &RequestContext) -> EntityGraph {
        EntityGraph::new()
            .with(principal_entity(&ctx.identity))
            .with(
                Entity::new(schema::photo_uid(UPLOAD_PLACEHOLDER_ID))
                    .with_parent(schema::account_uid(&ctx.identity.account_id)),
            )
    }

    async fn handle(&self, ctx: RequestContext) -> Response {
        // Persisting the upload belongs to the storage service
        info!(
            "Photo upload accepted: {} bytes for account {}",
            ctx.body.len(),
            ctx.identity.account_id
        );
        Json(UploadPhotoResponse {
            message: "upload photo successful!".to_string(),
            size: ctx.body.len(),
        })
        .into_response()
    }
}

/// GET /api/v1/photo/:id
///
/// The photo's parent edge is its true owner from the store, so a request
/// for another account's photo reaches the engine as a cross-account request.
pub struct ViewPhoto {
    photos: Arc<dyn PhotoStore>,
    base_url: String,
}

impl ViewPhoto {
    pub fn new(photos: Arc<dyn PhotoStore>, base_url: impl Into<String>) -> Self {
        Self {
            photos,
            base_url: base_url.into(),
        }
    }

    fn photo_id<'a>(&self, ctx: &'a RequestContext) -> &'a str {
        ctx.param("id").unwrap_or_default()
    }
}

#[async_trait]
impl AuthorizedHandler for ViewPhoto {
    fn action(&self, _ctx: &RequestContext) -> String {
        "ViewPhoto".to_string()
    }

    fn resource(&self, ctx: &RequestContext) -> (String, String) {
        (PHOTO_TYPE.to_string(), self.photo_id(ctx).to_string())
    }

    async fn entities(&self, ctx: &RequestContext) -> EntityGraph {
        let Some(photo) = self.photos.find(self.photo_id(ctx)).await else {
            debug!("Photo {} not found, submitting empty entity graph", self.photo_id(ctx));
            return EntityGraph::new();
        };

        EntityGraph::new()
            .with(principal_entity(&ctx.identity))
            .with(Entity::new(schema::photo_uid(&photo.id)).with_parent(schema::account_uid(&photo.owner)))
    }

    async fn handle(&self, ctx: RequestContext) -> Response {
        let image_url = format!(
            "{}/{}/photo.jpg",
            self.base_url.trim_end_matches('/'),
            self.photo_id(&ctx)
        );
        Json(ViewPhotoResponse { image_url }).into_response()
    }
}
