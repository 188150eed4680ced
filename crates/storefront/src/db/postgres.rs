//! `PostgreSQL` document store.
//!
//! Queries are checked at runtime (`sqlx::query`) so the crate builds without
//! a live database. Checkout runs in one transaction and locks the user row
//! with `SELECT ... FOR UPDATE`.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};

use qkart_core::{
    Address, AddressId, CartEntry, Money, OrderId, Product, ProductId, Rating, Username,
};

use super::RepositoryError;
use crate::models::{CheckoutError, OrderReceipt, UserRecord, plan_checkout};

const PRODUCT_COLUMNS: &str = "id, name, category, cost_cents, rating, image";

/// `PostgreSQL`-backed document store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub(super) async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub(super) async fn create_user(
        &self,
        username: &Username,
        password_hash: &str,
        balance: Money,
    ) -> Result<UserRecord, RepositoryError> {
        let row = sqlx::query(
            r"
            INSERT INTO users (username, password_hash, balance_cents)
            VALUES ($1, $2, $3)
            RETURNING username, password_hash, balance_cents, created_at
            ",
        )
        .bind(username)
        .bind(password_hash)
        .bind(balance)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("username already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        user_from_row(&row)
    }

    pub(super) async fn get_user(
        &self,
        username: &Username,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT username, password_hash, balance_cents, created_at
            FROM users
            WHERE username = $1
            ",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    pub(super) async fn balance(&self, username: &Username) -> Result<Money, RepositoryError> {
        let row = sqlx::query("SELECT balance_cents FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(row.try_get("balance_cents")?)
    }

    pub(super) async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY seq"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(product_from_row).collect()
    }

    pub(super) async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    pub(super) async fn search_products(&self, query: &str) -> Result<Vec<Product>, RepositoryError> {
        let needle = query.trim();
        if needle.is_empty() {
            return self.list_products().await;
        }

        let rows = sqlx::query(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE strpos(lower(name), lower($1)) > 0
               OR strpos(lower(category), lower($1)) > 0
            ORDER BY seq
            "
        ))
        .bind(needle)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(product_from_row).collect()
    }

    pub(super) async fn upsert_products(&self, products: &[Product]) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for product in products {
            let result = sqlx::query(
                r"
                INSERT INTO products (id, name, category, cost_cents, rating, image)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (id) DO UPDATE
                SET name = EXCLUDED.name,
                    category = EXCLUDED.category,
                    cost_cents = EXCLUDED.cost_cents,
                    rating = EXCLUDED.rating,
                    image = EXCLUDED.image
                ",
            )
            .bind(&product.id)
            .bind(&product.name)
            .bind(&product.category)
            .bind(product.cost)
            .bind(i16::from(product.rating.stars()))
            .bind(&product.image)
            .execute(&mut *tx)
            .await?;
            written += result.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }

    pub(super) async fn cart(&self, username: &Username) -> Result<Vec<CartEntry>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        ensure_user(&mut conn, username).await?;
        load_cart(&mut conn, username).await
    }

    pub(super) async fn set_cart_quantity(
        &self,
        username: &Username,
        product_id: &ProductId,
        qty: u32,
    ) -> Result<Vec<CartEntry>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        ensure_user(&mut tx, username).await?;

        if qty == 0 {
            sqlx::query("DELETE FROM cart_entries WHERE username = $1 AND product_id = $2")
                .bind(username)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
        } else {
            let qty = i32::try_from(qty)
                .map_err(|_| RepositoryError::DataCorruption(format!("quantity {qty} too large")))?;
            sqlx::query(
                r"
                INSERT INTO cart_entries (username, product_id, qty)
                VALUES ($1, $2, $3)
                ON CONFLICT (username, product_id) DO UPDATE SET qty = EXCLUDED.qty
                ",
            )
            .bind(username)
            .bind(product_id)
            .bind(qty)
            .execute(&mut *tx)
            .await?;
        }

        let cart = load_cart(&mut tx, username).await?;
        tx.commit().await?;
        Ok(cart)
    }

    pub(super) async fn addresses(&self, username: &Username) -> Result<Vec<Address>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        ensure_user(&mut conn, username).await?;
        load_addresses(&mut conn, username).await
    }

    pub(super) async fn add_address(
        &self,
        username: &Username,
        text: &str,
    ) -> Result<Vec<Address>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        ensure_user(&mut tx, username).await?;

        sqlx::query("INSERT INTO addresses (id, username, text) VALUES ($1, $2, $3)")
            .bind(AddressId::generate())
            .bind(username)
            .bind(text)
            .execute(&mut *tx)
            .await?;

        let addresses = load_addresses(&mut tx, username).await?;
        tx.commit().await?;
        Ok(addresses)
    }

    pub(super) async fn delete_address(
        &self,
        username: &Username,
        id: &AddressId,
    ) -> Result<Vec<Address>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        ensure_user(&mut tx, username).await?;

        let result = sqlx::query("DELETE FROM addresses WHERE username = $1 AND id = $2")
            .bind(username)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let addresses = load_addresses(&mut tx, username).await?;
        tx.commit().await?;
        Ok(addresses)
    }

    pub(super) async fn checkout(
        &self,
        username: &Username,
        address_id: &AddressId,
    ) -> Result<OrderReceipt, CheckoutError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let balance: Money = sqlx::query(
            "SELECT balance_cents FROM users WHERE username = $1 FOR UPDATE",
        )
        .bind(username)
        .fetch_optional(&mut *tx)
        .await
        .map_err(RepositoryError::from)?
        .ok_or(CheckoutError::UserNotFound)?
        .try_get("balance_cents")
        .map_err(RepositoryError::from)?;

        let entries = load_cart(&mut tx, username).await?;
        let addresses = load_addresses(&mut tx, username).await?;
        let catalog = load_catalog(&mut tx).await?;

        // Returning early drops `tx`, which rolls back.
        let plan = plan_checkout(balance, &entries, &catalog, addresses, address_id)?;
        let order_id = OrderId::generate();

        commit_order(&mut tx, username, &order_id, &plan.draft, plan.remaining).await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(OrderReceipt {
            order_id,
            total: plan.draft.subtotal,
            balance: plan.remaining,
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn ensure_user(conn: &mut PgConnection, username: &Username) -> Result<(), RepositoryError> {
    sqlx::query("SELECT 1 FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(&mut *conn)
        .await?
        .map(|_| ())
        .ok_or(RepositoryError::NotFound)
}

async fn load_cart(
    conn: &mut PgConnection,
    username: &Username,
) -> Result<Vec<CartEntry>, RepositoryError> {
    let rows = sqlx::query(
        "SELECT product_id, qty FROM cart_entries WHERE username = $1 ORDER BY id",
    )
    .bind(username)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter()
        .map(|row| {
            let product_id: ProductId = row.try_get("product_id")?;
            let qty: i32 = row.try_get("qty")?;
            let qty = u32::try_from(qty).map_err(|_| {
                RepositoryError::DataCorruption(format!("negative quantity {qty} in cart"))
            })?;
            Ok(CartEntry { product_id, qty })
        })
        .collect()
}

async fn load_addresses(
    conn: &mut PgConnection,
    username: &Username,
) -> Result<Vec<Address>, RepositoryError> {
    let rows = sqlx::query("SELECT id, text FROM addresses WHERE username = $1 ORDER BY seq")
        .bind(username)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter()
        .map(|row| {
            Ok(Address {
                id: row.try_get("id")?,
                text: row.try_get("text")?,
            })
        })
        .collect()
}

async fn load_catalog(conn: &mut PgConnection) -> Result<Vec<Product>, RepositoryError> {
    let rows = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY seq"))
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(product_from_row).collect()
}

async fn commit_order(
    conn: &mut PgConnection,
    username: &Username,
    order_id: &OrderId,
    draft: &qkart_core::OrderDraft,
    remaining: Money,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE users SET balance_cents = $2 WHERE username = $1")
        .bind(username)
        .bind(remaining)
        .execute(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM cart_entries WHERE username = $1")
        .bind(username)
        .execute(&mut *conn)
        .await?;

    let item_count = i64::try_from(draft.item_count)
        .map_err(|_| RepositoryError::DataCorruption("item count overflow".to_owned()))?;
    sqlx::query(
        r"
        INSERT INTO orders (id, username, address_id, total_cents, item_count)
        VALUES ($1, $2, $3, $4, $5)
        ",
    )
    .bind(order_id)
    .bind(username)
    .bind(&draft.address_id)
    .bind(draft.subtotal)
    .bind(item_count)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn user_from_row(row: &PgRow) -> Result<UserRecord, RepositoryError> {
    let username: String = row.try_get("username")?;
    let username = Username::parse(&username).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
    })?;

    Ok(UserRecord {
        username,
        password_hash: row.try_get("password_hash")?,
        balance: row.try_get("balance_cents")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn product_from_row(row: &PgRow) -> Result<Product, RepositoryError> {
    let stars: i16 = row.try_get("rating")?;
    let rating = u8::try_from(stars)
        .ok()
        .and_then(|s| Rating::new(s).ok())
        .ok_or_else(|| RepositoryError::DataCorruption(format!("invalid rating {stars}")))?;

    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        cost: row.try_get("cost_cents")?,
        rating,
        image: row.try_get("image")?,
    })
}
