use crate::server::ServerRouter;

mod account;
mod pages;
mod posts;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .merge(pages::routes())
        .merge(account::routes())
        .merge(posts::routes())
}
