#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use time::macros::datetime;
use tokio::sync::Mutex;

use lectern::application::books::BookService;
use lectern::application::recommendations::{RecommendationConfig, RecommendationService};
use lectern::application::repos::{
    BooksRepo, BooksWriteRepo, CreateBookParams, RecordRatingParams, RepoError, UpdateBookParams,
};
use lectern::cache::{CacheError, CacheStore, MemoryCacheStore};
use lectern::domain::entities::{BookRecord, BookSummary};
use lectern::domain::rating::{Rating, by_rank};
use lectern::util::{Clock, ManualClock};

/// 2024-03-01 09:30 UTC, a Friday.
pub const START: OffsetDateTime = datetime!(2024-03-01 09:30 UTC);

/// Books kept in memory, with a counter on the top-rated query.
#[derive(Default)]
pub struct InMemoryBooks {
    books: Mutex<BTreeMap<i64, BookRecord>>,
    next_id: AtomicUsize,
    top_rated_calls: AtomicUsize,
    fail_top_rated: AtomicBool,
}

impl InMemoryBooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn top_rated_calls(&self) -> usize {
        self.top_rated_calls.load(Ordering::SeqCst)
    }

    pub fn fail_top_rated(&self, fail: bool) {
        self.fail_top_rated.store(fail, Ordering::SeqCst);
    }

    /// Insert a book whose `total` ratings all equal `average`.
    pub async fn seed(&self, title: &str, average: f64, total: i64) -> i64 {
        let id = self.allocate_id();
        let user_ratings = (0..total)
            .map(|n| (format!("seed-{n}"), average))
            .collect::<BTreeMap<_, _>>();
        let book = BookRecord {
            id,
            title: title.to_string(),
            author: format!("{title} Author"),
            genre: "Fiction".to_string(),
            description: None,
            image_url: format!("https://img.example/{id}.jpg"),
            average_rating: if total > 0 { average } else { 0.0 },
            total_ratings: total,
            user_ratings,
            favorites: BTreeSet::new(),
            cart: BTreeSet::new(),
            created_at: START,
            updated_at: START,
        };
        self.books.lock().await.insert(id, book);
        id
    }

    pub async fn snapshot(&self, id: i64) -> Option<BookRecord> {
        self.books.lock().await.get(&id).cloned()
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1
    }
}

#[async_trait]
impl BooksRepo for InMemoryBooks {
    async fn list_books(&self) -> Result<Vec<BookRecord>, RepoError> {
        Ok(self.books.lock().await.values().cloned().collect())
    }

    async fn find_book(&self, id: i64) -> Result<Option<BookRecord>, RepoError> {
        Ok(self.books.lock().await.get(&id).cloned())
    }

    async fn top_rated(&self, limit: u32) -> Result<Vec<BookSummary>, RepoError> {
        self.top_rated_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_top_rated.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }

        let books = self.books.lock().await;
        let mut rated: Vec<BookSummary> = books
            .values()
            .filter(|book| book.total_ratings > 0)
            .map(BookRecord::summary)
            .collect();
        rated.sort_by(by_rank);
        rated.truncate(limit as usize);
        Ok(rated)
    }

    async fn list_in_cart(&self, user_id: &str) -> Result<Vec<BookRecord>, RepoError> {
        Ok(self
            .books
            .lock()
            .await
            .values()
            .filter(|book| book.cart.contains(user_id))
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

#[async_trait]
impl BooksWriteRepo for InMemoryBooks {
    async fn create_book(&self, params: CreateBookParams) -> Result<BookRecord, RepoError> {
        let id = self.allocate_id();
        let book = BookRecord {
            id,
            title: params.title,
            author: params.author,
            genre: params.genre,
            description: params.description,
            image_url: params.image_url,
            average_rating: 0.0,
            total_ratings: 0,
            user_ratings: BTreeMap::new(),
            favorites: BTreeSet::new(),
            cart: BTreeSet::new(),
            created_at: START,
            updated_at: START,
        };
        self.books.lock().await.insert(id, book.clone());
        Ok(book)
    }

    async fn update_book(
        &self,
        params: UpdateBookParams,
    ) -> Result<Option<BookRecord>, RepoError> {
        let mut books = self.books.lock().await;
        Ok(books.get_mut(&params.id).map(|book| {
            book.title = params.title;
            book.author = params.author;
            book.genre = params.genre;
            book.description = params.description;
            book.image_url = params.image_url;
            book.clone()
        }))
    }

    async fn delete_book(&self, id: i64) -> Result<bool, RepoError> {
        Ok(self.books.lock().await.remove(&id).is_some())
    }

    async fn record_rating(
        &self,
        params: RecordRatingParams,
    ) -> Result<Option<BookRecord>, RepoError> {
        let rating = Rating::new(params.rating).map_err(|err| RepoError::InvalidInput {
            message: err.to_string(),
        })?;
        let mut books = self.books.lock().await;
        Ok(books.get_mut(&params.book_id).map(|book| {
            book.apply_rating(&params.user_id, rating);
            book.clone()
        }))
    }

    async fn toggle_favorite(
        &self,
        book_id: i64,
        user_id: &str,
    ) -> Result<Option<BookRecord>, RepoError> {
        let mut books = self.books.lock().await;
        Ok(books.get_mut(&book_id).map(|book| {
            if !book.favorites.remove(user_id) {
                book.favorites.insert(user_id.to_string());
            }
            book.clone()
        }))
    }

    async fn toggle_cart(
        &self,
        book_id: i64,
        user_id: &str,
    ) -> Result<Option<BookRecord>, RepoError> {
        let mut books = self.books.lock().await;
        Ok(books.get_mut(&book_id).map(|book| {
            if !book.cart.remove(user_id) {
                book.cart.insert(user_id.to_string());
            }
            book.clone()
        }))
    }
}

/// A cache that refuses every operation.
pub struct UnavailableCache;

#[async_trait]
impl CacheStore for UnavailableCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn set_if_absent(
        &self,
        _key: &str,
        _value: &str,
        _ttl: Duration,
    ) -> Result<bool, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn exists(&self, _key: &str) -> Result<bool, CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::unavailable("connection refused"))
    }
}

pub struct Harness {
    pub books: Arc<InMemoryBooks>,
    pub cache: Arc<MemoryCacheStore>,
    pub clock: Arc<ManualClock>,
    pub book_service: Arc<BookService>,
    pub recommendations: Arc<RecommendationService>,
}

impl Harness {
    pub fn new() -> Self {
        let books = Arc::new(InMemoryBooks::new());
        let clock = Arc::new(ManualClock::new(START));
        let cache = Arc::new(MemoryCacheStore::new(clock.clone() as Arc<dyn Clock>));
        let book_service = Arc::new(BookService::new(books.clone(), books.clone()));
        let recommendations = Arc::new(RecommendationService::new(
            books.clone(),
            cache.clone(),
            clock.clone(),
            RecommendationConfig::default(),
        ));

        Self {
            books,
            cache,
            clock,
            book_service,
            recommendations,
        }
    }

    pub fn ids(summaries: &[BookSummary]) -> Vec<i64> {
        summaries.iter().map(|book| book.id).collect()
    }
}
