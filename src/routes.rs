//! The application's route table.
//!
//! ```text
//! GET    /              200, empty
//! GET    /echo/:message text/plain echo, compressed when negotiated
//! GET    /user-agent    the User-Agent header, 400 without one
//! GET    /files/:name   file bytes, 404 when absent
//! POST   /files/:name   store the body, 201
//! DELETE /files/:name   204, 404 when absent
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use crate::compression::CompressionRegistry;
use crate::error::HandlerError;
use crate::files;
use crate::http::request::Request;
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::router::{Params, Router};

fn param<'a>(params: &'a Params, name: &'static str) -> Result<&'a str, HandlerError> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or(HandlerError::MissingParam(name))
}

/// Builds the router for a server serving files out of `root`.
pub fn app_router(root: impl Into<PathBuf>, compression: Arc<CompressionRegistry>) -> Router {
    let root: Arc<PathBuf> = Arc::new(root.into());
    let mut router = Router::new();

    router.get("/", |_req, _params| Ok(Response::empty(StatusCode::Ok)));

    router.get("/echo/:message", move |req, params| {
        let message = param(params, "message")?;
        let response = Response::text(message.as_bytes().to_vec());
        Ok(compression.encode(req.encoding.as_deref(), response))
    });

    router.get("/user-agent", |req: &Request, _params| {
        Ok(match req.header("User-Agent") {
            Some(agent) => Response::text(agent.as_bytes().to_vec()),
            None => Response::empty(StatusCode::BadRequest),
        })
    });

    let files_root = Arc::clone(&root);
    router.get("/files/:name", move |_req, params| {
        let path = files::validate(&files_root, param(params, "name")?)?;
        Ok(match files::read_file(&path)? {
            Some(content) => ResponseBuilder::new(StatusCode::Ok)
                .header("Content-Type", "application/octet-stream")
                .body(content)
                .build(),
            None => Response::not_found(),
        })
    });

    let files_root = Arc::clone(&root);
    router.post("/files/:name", move |req, params| {
        let path = files::validate(&files_root, param(params, "name")?)?;
        files::save_file(&path, &req.body)?;
        tracing::info!(path = %path.display(), bytes = req.body.len(), "Saved file");
        Ok(Response::empty(StatusCode::Created))
    });

    let files_root = root;
    router.delete("/files/:name", move |_req, params| {
        let path = files::validate(&files_root, param(params, "name")?)?;
        Ok(if files::delete_file(&path)? {
            Response::empty(StatusCode::NoContent)
        } else {
            Response::not_found()
        })
    });

    router
}
