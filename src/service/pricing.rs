use bigdecimal::{BigDecimal, Zero};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::models::{NewOrderItem, NewReturn, OrderItem, PricedItem, ProductCategory, Return};

/// 已有明细的价格快照: 品类ID → 首次出现的单价
pub fn snapshot_prices(existing: &[OrderItem]) -> HashMap<Uuid, BigDecimal> {
    let mut prices = HashMap::new();
    for item in existing {
        if let Some(category_id) = item.category_id {
            prices
                .entry(category_id)
                .or_insert_with(|| item.price_per_piece.clone());
        }
    }
    prices
}

/// 给订单明细定价, 返回 (明细, 订单总额)
///
/// 新订单 `existing` 为空, 全部取品类当前价; 写入后单价即成为快照。
/// 编辑订单时品类未变的行沿用原快照价, 新增或换品类的行取当前价,
/// 因此 `categories` 只需覆盖没有快照的品类。
pub fn price_order_items(
    items: &[NewOrderItem],
    existing: &[OrderItem],
    categories: &[ProductCategory],
) -> BillingResult<(Vec<PricedItem>, BigDecimal)> {
    if items.is_empty() {
        return Err(BillingError::Validation(
            "an order needs at least one item".to_string(),
        ));
    }

    let snapshots = snapshot_prices(existing);
    let current: HashMap<Uuid, &BigDecimal> = categories
        .iter()
        .map(|c| (c.id, &c.price_per_piece))
        .collect();

    let mut priced = Vec::with_capacity(items.len());
    let mut total = BigDecimal::zero();
    for item in items {
        let price = snapshots
            .get(&item.category_id)
            .or_else(|| current.get(&item.category_id).copied())
            .ok_or_else(|| BillingError::not_found("category", item.category_id))?;
        let subtotal = line_amount(item.quantity, price)?;
        total += &subtotal;
        priced.push(PricedItem {
            category_id: item.category_id,
            quantity: item.quantity,
            price_per_piece: price.clone(),
            subtotal,
        });
    }

    Ok((priced, total))
}

/// 退货定价, 返回 (单价, 扣款)
///
/// 编辑时若品类未变则沿用原记录的单价; 否则取 `current` (品类当前价)。
pub fn price_return_line(
    ret: &NewReturn,
    previous: Option<&Return>,
    current: Option<&ProductCategory>,
) -> BillingResult<(BigDecimal, BigDecimal)> {
    let kept = previous
        .filter(|p| p.category_id == Some(ret.category_id))
        .map(|p| &p.price_per_unit);
    let price = kept
        .or_else(|| current.map(|c| &c.price_per_piece))
        .ok_or_else(|| BillingError::not_found("category", ret.category_id))?;
    let deduction = line_amount(ret.quantity, price)?;
    Ok((price.clone(), deduction))
}

/// 数量 × 单价, 数量必须为正
pub fn line_amount(quantity: i32, unit_price: &BigDecimal) -> BillingResult<BigDecimal> {
    if quantity <= 0 {
        return Err(BillingError::Validation(format!(
            "quantity must be positive, got {}",
            quantity
        )));
    }
    Ok(unit_price * BigDecimal::from(quantity))
}
