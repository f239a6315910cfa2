//! Order repository.
//!
//! Placing an order and cancelling one are single transactions: stock moves
//! together with the order row or not at all. Product rows are locked in id
//! order so concurrent checkouts over the same products cannot deadlock.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use tribal_market_core::{
    ArtistId, BuyerId, OrderId, OrderStatus, Page, Pagination, PaymentStatus, Price, ProductId,
};

use super::RepositoryError;
use crate::models::{ArtistOrder, Order, OrderItem, OrderLineInput, ShippingAddress};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    buyer_id: BuyerId,
    status: OrderStatus,
    payment_status: PaymentStatus,
    payment_reference: Option<String>,
    total_amount: Price,
    shipping_address: Json<ShippingAddress>,
    notes: Option<String>,
    tracking_number: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    delivered_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn with_items(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            buyer_id: self.buyer_id,
            status: self.status,
            payment_status: self.payment_status,
            payment_reference: self.payment_reference,
            total_amount: self.total_amount,
            shipping_address: self.shipping_address.0,
            notes: self.notes,
            tracking_number: self.tracking_number,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
            delivered_at: self.delivered_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LockedProduct {
    id: ProductId,
    artist_id: ArtistId,
    name: String,
    price: Price,
    stock: i32,
    is_active: bool,
}

#[derive(sqlx::FromRow)]
struct StatusRow {
    status: OrderStatus,
    payment_status: PaymentStatus,
}

const ORDER_COLUMNS: &str = "id, buyer_id, status, payment_status, payment_reference, total_amount, shipping_address, notes, tracking_number, created_at, updated_at, delivered_at";

const ITEM_COLUMNS: &str =
    "id, order_id, product_id, artist_id, product_name, quantity, unit_price";

/// A validated order ready to be placed.
#[derive(Debug, Clone, Copy)]
pub struct NewOrder<'a> {
    pub buyer_id: BuyerId,
    /// One line per product, quantities already validated.
    pub lines: &'a [OrderLineInput],
    pub shipping_address: &'a ShippingAddress,
    pub notes: Option<&'a str>,
    /// Empty the buyer's cart as part of the same transaction.
    pub clear_cart: bool,
}

async fn items_for(
    conn: &mut PgConnection,
    order_ids: &[i32],
) -> Result<HashMap<OrderId, Vec<OrderItem>>, RepositoryError> {
    let items: Vec<OrderItem> = sqlx::query_as(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY id"
    ))
    .bind(order_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for item in items {
        grouped.entry(item.order_id).or_default().push(item);
    }
    Ok(grouped)
}

async fn attach_items(
    conn: &mut PgConnection,
    rows: Vec<OrderRow>,
) -> Result<Vec<Order>, RepositoryError> {
    let ids: Vec<i32> = rows.iter().map(|r| r.id.as_i32()).collect();
    let mut items = items_for(conn, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let lines = items.remove(&row.id).unwrap_or_default();
            row.with_items(lines)
        })
        .collect())
}

async fn lock_order(
    conn: &mut PgConnection,
    id: OrderId,
) -> Result<StatusRow, RepositoryError> {
    sqlx::query_as("SELECT status, payment_status FROM orders WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(RepositoryError::NotFound)
}

async fn fetch_order(conn: &mut PgConnection, id: OrderId) -> Result<Order, RepositoryError> {
    let row: OrderRow = sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    let mut items = items_for(conn, &[id.as_i32()]).await?;
    let lines = items.remove(&id).unwrap_or_default();
    Ok(row.with_items(lines))
}

/// Order lines checked against locked products, as parallel columns for
/// the `UNNEST` inserts.
#[derive(Debug)]
struct PricedLines {
    total: Price,
    quantities: Vec<i32>,
    artist_ids: Vec<i32>,
    names: Vec<String>,
    unit_prices: Vec<Decimal>,
}

/// Check every line against its locked product and compute the total.
///
/// Runs before any stock is touched, so a rejected line leaves nothing to
/// roll back.
fn price_lines(
    lines: &[OrderLineInput],
    products: &HashMap<ProductId, LockedProduct>,
) -> Result<PricedLines, RepositoryError> {
    let mut priced = PricedLines {
        total: Price::zero(),
        quantities: Vec::with_capacity(lines.len()),
        artist_ids: Vec::with_capacity(lines.len()),
        names: Vec::with_capacity(lines.len()),
        unit_prices: Vec::with_capacity(lines.len()),
    };

    for line in lines {
        let product = products
            .get(&line.product_id)
            .filter(|p| p.is_active)
            .ok_or(RepositoryError::NotFound)?;

        if product.stock < line.quantity {
            return Err(RepositoryError::InsufficientStock {
                product_id: product.id,
                available: product.stock,
                requested: line.quantity,
            });
        }

        let quantity = u32::try_from(line.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("negative quantity {}", line.quantity))
        })?;
        priced.total = product
            .price
            .line_total(quantity)
            .and_then(|line_total| priced.total.checked_add(line_total))
            .map_err(RepositoryError::TotalTooLarge)?;
        priced.quantities.push(line.quantity);
        priced.artist_ids.push(product.artist_id.as_i32());
        priced.names.push(product.name.clone());
        priced.unit_prices.push(Decimal::from(product.price));
    }

    Ok(priced)
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order.
    ///
    /// Locks every product, checks it is active and has enough stock,
    /// decrements stock, snapshots prices and inserts the order with its
    /// items. Any failure rolls the whole order back.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if a product is missing or inactive.
    /// Returns `RepositoryError::InsufficientStock` if a line exceeds stock.
    /// Returns `RepositoryError::TotalTooLarge` if the total overflows.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(&self, new: NewOrder<'_>) -> Result<Order, RepositoryError> {
        let mut lines = new.lines.to_vec();
        lines.sort_by_key(|l| l.product_id);
        let ids: Vec<i32> = lines.iter().map(|l| l.product_id.as_i32()).collect();

        let mut tx = self.pool.begin().await?;

        let locked: Vec<LockedProduct> = sqlx::query_as(
            r"
            SELECT id, artist_id, name, price, stock, is_active
            FROM products
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            ",
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;
        let products: HashMap<ProductId, LockedProduct> =
            locked.into_iter().map(|p| (p.id, p)).collect();

        let priced = price_lines(&lines, &products)?;

        sqlx::query(
            r"
            UPDATE products p
            SET stock = p.stock - d.quantity, updated_at = NOW()
            FROM UNNEST($1::int4[], $2::int4[]) AS d(id, quantity)
            WHERE p.id = d.id
            ",
        )
        .bind(&ids)
        .bind(&priced.quantities)
        .execute(&mut *tx)
        .await?;

        let row: OrderRow = sqlx::query_as(&format!(
            r"
            INSERT INTO orders (buyer_id, total_amount, shipping_address, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(new.buyer_id)
        .bind(priced.total)
        .bind(Json(new.shipping_address))
        .bind(new.notes)
        .fetch_one(&mut *tx)
        .await?;

        let mut items: Vec<OrderItem> = sqlx::query_as(&format!(
            r"
            INSERT INTO order_items (order_id, product_id, artist_id, product_name, quantity, unit_price)
            SELECT $1, d.product_id, d.artist_id, d.product_name, d.quantity, d.unit_price
            FROM UNNEST($2::int4[], $3::int4[], $4::text[], $5::int4[], $6::numeric[])
                AS d(product_id, artist_id, product_name, quantity, unit_price)
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(row.id)
        .bind(&ids)
        .bind(&priced.artist_ids)
        .bind(&priced.names)
        .bind(&priced.quantities)
        .bind(&priced.unit_prices)
        .fetch_all(&mut *tx)
        .await?;
        items.sort_by_key(|i| i.id);

        if new.clear_cart {
            sqlx::query("DELETE FROM cart_items WHERE buyer_id = $1")
                .bind(new.buyer_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(row.with_items(items))
    }

    /// Get an order with all of its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        match fetch_order(&mut conn, id).await {
            Ok(order) => Ok(Some(order)),
            Err(RepositoryError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// A page of a buyer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_buyer(
        &self,
        buyer_id: BuyerId,
        pagination: Pagination,
    ) -> Result<Page<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE buyer_id = $1")
            .bind(buyer_id)
            .fetch_one(&mut *conn)
            .await?;

        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE buyer_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(buyer_id)
        .bind(pagination.sql_limit())
        .bind(pagination.offset())
        .fetch_all(&mut *conn)
        .await?;

        let orders = attach_items(&mut conn, rows).await?;
        Ok(Page::new(orders, pagination, total))
    }

    /// A page of the orders containing an artist's items, newest first,
    /// each narrowed to that artist's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_artist(
        &self,
        artist_id: ArtistId,
        pagination: Pagination,
    ) -> Result<Page<ArtistOrder>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT order_id) FROM order_items WHERE artist_id = $1",
        )
        .bind(artist_id)
        .fetch_one(&mut *conn)
        .await?;

        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM orders o
            WHERE EXISTS (
                SELECT 1 FROM order_items oi WHERE oi.order_id = o.id AND oi.artist_id = $1
            )
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(artist_id)
        .bind(pagination.sql_limit())
        .bind(pagination.offset())
        .fetch_all(&mut *conn)
        .await?;

        let orders = attach_items(&mut conn, rows).await?;
        let scoped = orders
            .into_iter()
            .map(|o| o.scoped_to(artist_id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(scoped, pagination, total))
    }

    /// Move an order to a new fulfilment status.
    ///
    /// Cancelling puts every item's quantity back into stock and settles the
    /// payment status (a paid order becomes refunded). Delivering stamps
    /// `delivered_at`. A tracking number is only recorded when shipping.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Conflict` if the transition is not allowed.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
        tracking_number: Option<&str>,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = lock_order(&mut tx, id).await?;
        current
            .status
            .transition_to(next)
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;

        if next == OrderStatus::Cancelled {
            sqlx::query(
                r"
                UPDATE products p
                SET stock = p.stock + oi.quantity, updated_at = NOW()
                FROM order_items oi
                WHERE oi.order_id = $1 AND p.id = oi.product_id
                ",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        let payment_status = if next == OrderStatus::Cancelled {
            current.payment_status.after_cancellation()
        } else {
            current.payment_status
        };
        let tracking_number = tracking_number.filter(|_| next == OrderStatus::Shipped);

        sqlx::query(
            r"
            UPDATE orders SET
                status = $2,
                payment_status = $3,
                tracking_number = COALESCE($4, tracking_number),
                delivered_at = CASE WHEN $2 = 'delivered'::order_status THEN NOW() ELSE delivered_at END,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(next)
        .bind(payment_status)
        .bind(tracking_number)
        .execute(&mut *tx)
        .await?;

        let order = fetch_order(&mut tx, id).await?;
        tx.commit().await?;

        Ok(order)
    }

    /// Record a payment outcome.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Conflict` if the transition is not allowed
    /// or the order was cancelled.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update_payment(
        &self,
        id: OrderId,
        next: PaymentStatus,
        reference: Option<&str>,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = lock_order(&mut tx, id).await?;
        if current.status == OrderStatus::Cancelled && next == PaymentStatus::Paid {
            return Err(RepositoryError::Conflict(
                "cannot pay for a cancelled order".to_owned(),
            ));
        }
        current
            .payment_status
            .transition_to(next)
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;

        sqlx::query(
            r"
            UPDATE orders SET
                payment_status = $2,
                payment_reference = COALESCE($3, payment_reference),
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(next)
        .bind(reference)
        .execute(&mut *tx)
        .await?;

        let order = fetch_order(&mut tx, id).await?;
        tx.commit().await?;

        Ok(order)
    }
}
