use std::sync::Arc;

use crate::application::books::BookService;
use crate::application::recommendations::RecommendationService;

#[derive(Clone)]
pub struct ApiState {
    pub books: Arc<BookService>,
    pub recommendations: Arc<RecommendationService>,
}
