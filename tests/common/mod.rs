//! Shared bookstore fixture
//!
//! Twelve books with distinct prices and titles, inserted in a fixed order.

#![allow(dead_code)]

use foliodb::{Document, DocumentStore, Value};
use serde_json::json;

/// The catalog in insertion order
pub fn books() -> Vec<Document> {
    [
        json!({"_id": "b01", "title": "To Kill a Mockingbird", "author": "Harper Lee", "genre": "Fiction", "published_year": 1960, "price": 12.99, "in_stock": true, "pages": 336}),
        json!({"_id": "b02", "title": "1984", "author": "George Orwell", "genre": "Dystopian", "published_year": 1949, "price": 10.99, "in_stock": true, "pages": 328}),
        json!({"_id": "b03", "title": "The Great Gatsby", "author": "F. Scott Fitzgerald", "genre": "Fiction", "published_year": 1925, "price": 9.99, "in_stock": true, "pages": 180}),
        json!({"_id": "b04", "title": "Brave New World", "author": "Aldous Huxley", "genre": "Dystopian", "published_year": 1932, "price": 11.50, "in_stock": false, "pages": 311}),
        json!({"_id": "b05", "title": "The Hobbit", "author": "J.R.R. Tolkien", "genre": "Fantasy", "published_year": 1937, "price": 14.99, "in_stock": true, "pages": 310}),
        json!({"_id": "b06", "title": "The Catcher in the Rye", "author": "J.D. Salinger", "genre": "Fiction", "published_year": 1951, "price": 8.99, "in_stock": true, "pages": 224}),
        json!({"_id": "b07", "title": "Pride and Prejudice", "author": "Jane Austen", "genre": "Romance", "published_year": 1813, "price": 7.99, "in_stock": true, "pages": 432}),
        json!({"_id": "b08", "title": "The Lord of the Rings", "author": "J.R.R. Tolkien", "genre": "Fantasy", "published_year": 1954, "price": 19.99, "in_stock": true, "pages": 1178}),
        json!({"_id": "b09", "title": "Animal Farm", "author": "George Orwell", "genre": "Political Satire", "published_year": 1945, "price": 8.50, "in_stock": false, "pages": 112}),
        json!({"_id": "b10", "title": "The Alchemist", "author": "Paulo Coelho", "genre": "Fiction", "published_year": 1988, "price": 10.50, "in_stock": true, "pages": 197}),
        json!({"_id": "b11", "title": "Moby Dick", "author": "Herman Melville", "genre": "Adventure", "published_year": 1851, "price": 12.50, "in_stock": false, "pages": 635}),
        json!({"_id": "b12", "title": "Wuthering Heights", "author": "Emily Bronte", "genre": "Gothic Fiction", "published_year": 1847, "price": 9.50, "in_stock": true, "pages": 342}),
    ]
    .iter()
    .map(|raw| Document::from_json(raw).expect("fixture document"))
    .collect()
}

/// A store holding the whole catalog, no indexes
pub fn bookstore() -> DocumentStore {
    let mut store = DocumentStore::new();
    store.insert_many(books()).expect("fixture insert");
    store
}

/// Titles in result order
pub fn titles<'a>(docs: impl IntoIterator<Item = &'a Document>) -> Vec<String> {
    docs.into_iter()
        .filter_map(|d| d.get("title").and_then(Value::as_str))
        .map(String::from)
        .collect()
}
