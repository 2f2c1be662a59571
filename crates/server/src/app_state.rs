use server_api::ApiContext;

use crate::card_feed::CardFeed;

pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) card_feed: CardFeed,
}
