use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

use crate::models::{
    Aggregation, CategoryBreakdown, Order, OrderItem, Return, SupplierTotals, TimePoint,
    TopSeller, UNKNOWN_LABEL,
};

/// 分组键: 优先用实体ID, 没有ID时才退回展示名, 避免同名实体被合并
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Id(Uuid),
    Name(String),
}

impl GroupKey {
    fn of(id: Option<Uuid>, label: &str) -> Self {
        match id {
            Some(id) => GroupKey::Id(id),
            None => GroupKey::Name(label.to_string()),
        }
    }
}

fn label_or_unknown(name: Option<&str>) -> &str {
    match name {
        Some(n) if !n.trim().is_empty() => n,
        _ => UNKNOWN_LABEL,
    }
}

/// 品类累加器
///
/// 同一品类在周期内可能出现多个快照单价。报表取出现次数最多的单价,
/// 次数相同取先出现的那个。
#[derive(Debug)]
struct CategoryAcc {
    name: String,
    quantity: i64,
    subtotal: BigDecimal,
    prices: Vec<(BigDecimal, usize)>, // (快照单价, 出现次数), 按首次出现排序
}

impl CategoryAcc {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            quantity: 0,
            subtotal: BigDecimal::zero(),
            prices: Vec::new(),
        }
    }

    fn add(&mut self, item: &OrderItem) {
        self.quantity += i64::from(item.quantity);
        self.subtotal += &item.subtotal;
        match self.prices.iter_mut().find(|(p, _)| *p == item.price_per_piece) {
            Some((_, n)) => *n += 1,
            None => self.prices.push((item.price_per_piece.clone(), 1)),
        }
    }

    fn reported_price(&self) -> BigDecimal {
        let mut best: Option<&(BigDecimal, usize)> = None;
        for entry in &self.prices {
            let is_better = match best {
                None => true,
                Some((_, best_n)) => entry.1 > *best_n,
            };
            if is_better {
                best = Some(entry);
            }
        }
        best.map(|(p, _)| p.clone()).unwrap_or_else(BigDecimal::zero)
    }
}

#[derive(Debug)]
struct SupplierAcc {
    name: String,
    revenue: BigDecimal,
    returns: BigDecimal,
    has_orders: bool,
}

impl SupplierAcc {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            revenue: BigDecimal::zero(),
            returns: BigDecimal::zero(),
            has_orders: false,
        }
    }
}

/// 汇总一个时间窗口内的订单、明细和退货
///
/// 输入是已按窗口和供货商过滤好的三组独立查询结果; 明细只保留父订单在
/// `orders` 中的那部分。纯函数, 空输入得到全零结果。
pub fn aggregate(orders: &[Order], items: &[OrderItem], returns: &[Return]) -> Aggregation {
    let order_ids: HashSet<Uuid> = orders.iter().map(|o| o.id).collect();

    let mut gross_amount = BigDecimal::zero();
    let mut suppliers: IndexMap<GroupKey, SupplierAcc> = IndexMap::new();
    let mut by_date: BTreeMap<NaiveDate, (usize, BigDecimal)> = BTreeMap::new();

    for order in orders {
        gross_amount += &order.total_amount;

        let name = label_or_unknown(order.seller_name.as_deref());
        let acc = suppliers
            .entry(GroupKey::of(order.seller_id, name))
            .or_insert_with(|| SupplierAcc::new(name));
        acc.revenue += &order.total_amount;
        acc.has_orders = true;

        let point = by_date
            .entry(order.order_date)
            .or_insert_with(|| (0, BigDecimal::zero()));
        point.0 += 1;
        point.1 += &order.total_amount;
    }

    let mut total_pieces = 0i64;
    let mut categories: IndexMap<GroupKey, CategoryAcc> = IndexMap::new();
    for item in items.iter().filter(|i| order_ids.contains(&i.order_id)) {
        total_pieces += i64::from(item.quantity);
        let name = label_or_unknown(item.category_name.as_deref());
        categories
            .entry(GroupKey::of(item.category_id, name))
            .or_insert_with(|| CategoryAcc::new(name))
            .add(item);
    }

    let mut total_returns = BigDecimal::zero();
    let mut total_return_qty = 0i64;
    for ret in returns {
        total_returns += &ret.total_deduction;
        total_return_qty += i64::from(ret.quantity);

        let name = label_or_unknown(ret.seller_name.as_deref());
        suppliers
            .entry(GroupKey::of(ret.seller_id, name))
            .or_insert_with(|| SupplierAcc::new(name))
            .returns += &ret.total_deduction;
    }

    // 最高收入者胜出; 金额相同保留先出现的供货商
    let mut top_seller: Option<&SupplierAcc> = None;
    for acc in suppliers.values().filter(|a| a.has_orders) {
        let is_better = match top_seller {
            None => true,
            Some(best) => acc.revenue > best.revenue,
        };
        if is_better {
            top_seller = Some(acc);
        }
    }
    let top_seller = top_seller.map(|acc| TopSeller {
        name: acc.name.clone(),
        amount: acc.revenue.clone(),
    });

    let category_breakdown: Vec<CategoryBreakdown> = categories
        .into_iter()
        .map(|(key, acc)| CategoryBreakdown {
            category_id: match key {
                GroupKey::Id(id) => Some(id),
                GroupKey::Name(_) => None,
            },
            price_per_piece: acc.reported_price(),
            name: acc.name,
            quantity: acc.quantity,
            subtotal: acc.subtotal,
        })
        .collect();

    let suppliers: Vec<SupplierTotals> = suppliers
        .into_iter()
        .map(|(key, acc)| SupplierTotals {
            seller_id: match key {
                GroupKey::Id(id) => Some(id),
                GroupKey::Name(_) => None,
            },
            seller: acc.name,
            revenue: acc.revenue,
            returns: acc.returns,
        })
        .collect();

    let orders_over_time: Vec<TimePoint> = by_date
        .into_iter()
        .map(|(date, (count, amount))| TimePoint {
            date,
            label: date.format("%b %-d").to_string(),
            orders: count,
            amount,
        })
        .collect();

    let net_payable = &gross_amount - &total_returns;

    tracing::debug!(
        "Aggregated {} orders, {} pieces, {} returns: gross={}, net={}",
        orders.len(),
        total_pieces,
        returns.len(),
        gross_amount,
        net_payable
    );

    Aggregation {
        order_count: orders.len(),
        total_pieces,
        gross_amount,
        total_returns,
        total_return_qty,
        net_payable,
        category_breakdown,
        suppliers,
        top_seller,
        orders_over_time,
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::{TimeZone, Utc};

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn seller_id(n: u128) -> Uuid {
        Uuid::from_u128((0x5e11e7u128 << 64) | n)
    }

    pub fn category_id(n: u128) -> Uuid {
        Uuid::from_u128((0xca7u128 << 64) | n)
    }

    pub fn order(id: u128, seller: Option<(u128, &str)>, on: NaiveDate, amount: i64) -> Order {
        Order {
            id: Uuid::from_u128(id),
            order_date: on,
            seller_id: seller.map(|(n, _)| seller_id(n)),
            seller_name: seller.map(|(_, name)| name.to_string()),
            notes: None,
            total_amount: BigDecimal::from(amount),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    pub fn item(order: u128, category: (u128, &str), qty: i32, price: i64) -> OrderItem {
        OrderItem {
            id: Uuid::new_v4(),
            order_id: Uuid::from_u128(order),
            category_id: Some(category_id(category.0)),
            category_name: Some(category.1.to_string()),
            quantity: qty,
            price_per_piece: BigDecimal::from(price),
            subtotal: BigDecimal::from(price * i64::from(qty)),
        }
    }

    pub fn ret(seller: (u128, &str), on: NaiveDate, qty: i32, price: i64) -> Return {
        Return {
            id: Uuid::new_v4(),
            return_date: on,
            seller_id: Some(seller_id(seller.0)),
            seller_name: Some(seller.1.to_string()),
            category_id: Some(category_id(1)),
            category_name: Some("Hoodie".to_string()),
            quantity: qty,
            price_per_unit: BigDecimal::from(price),
            total_deduction: BigDecimal::from(price * i64::from(qty)),
            reason: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    const A: (u128, &str) = (1, "A");
    const B: (u128, &str) = (2, "B");
    const HOODIE: (u128, &str) = (1, "Hoodie");
    const SHIRT: (u128, &str) = (2, "Shirt");

    fn breakdown_sum(agg: &Aggregation) -> BigDecimal {
        agg.category_breakdown
            .iter()
            .fold(BigDecimal::zero(), |acc, c| acc + &c.subtotal)
    }

    #[test]
    fn empty_input_gives_zero_summary() {
        let agg = aggregate(&[], &[], &[]);
        assert_eq!(agg.order_count, 0);
        assert_eq!(agg.total_pieces, 0);
        assert_eq!(agg.gross_amount, BigDecimal::zero());
        assert_eq!(agg.total_returns, BigDecimal::zero());
        assert_eq!(agg.net_payable, BigDecimal::zero());
        assert!(agg.category_breakdown.is_empty());
        assert!(agg.suppliers.is_empty());
        assert!(agg.orders_over_time.is_empty());
        assert!(agg.top_seller.is_none());
    }

    #[test]
    fn single_order_category_breakdown() {
        let orders = vec![order(1, Some(A), date(2025, 1, 5), 24500)];
        let items = vec![item(1, HOODIE, 50, 230), item(1, SHIRT, 100, 130)];
        let agg = aggregate(&orders, &items, &[]);

        assert_eq!(agg.gross_amount, BigDecimal::from(24500));
        assert_eq!(agg.net_payable, BigDecimal::from(24500));
        assert_eq!(agg.total_pieces, 150);

        let rows: Vec<(&str, i64, i64, i64)> = agg
            .category_breakdown
            .iter()
            .map(|c| {
                (
                    c.name.as_str(),
                    c.price_per_piece.to_string().parse().unwrap(),
                    c.quantity,
                    c.subtotal.to_string().parse().unwrap(),
                )
            })
            .collect();
        assert_eq!(rows, vec![("Hoodie", 230, 50, 11500), ("Shirt", 130, 100, 13000)]);
        assert_eq!(breakdown_sum(&agg), agg.gross_amount);
    }

    #[test]
    fn returns_are_deducted() {
        let orders = vec![order(1, Some(A), date(2025, 1, 5), 10000)];
        let returns = vec![ret(A, date(2025, 1, 9), 10, 150)];
        let agg = aggregate(&orders, &[], &returns);

        assert_eq!(agg.total_returns, BigDecimal::from(1500));
        assert_eq!(agg.total_return_qty, 10);
        assert_eq!(agg.net_payable, BigDecimal::from(8500));

        assert_eq!(agg.suppliers.len(), 1);
        assert_eq!(agg.suppliers[0].revenue, BigDecimal::from(10000));
        assert_eq!(agg.suppliers[0].returns, BigDecimal::from(1500));
    }

    #[test]
    fn net_payable_may_go_negative() {
        let orders = vec![order(1, Some(A), date(2025, 1, 5), 1000)];
        let returns = vec![ret(A, date(2025, 1, 9), 10, 300)];
        let agg = aggregate(&orders, &[], &returns);

        assert_eq!(agg.net_payable, BigDecimal::from(-2000));
        assert_eq!(&agg.gross_amount - &agg.total_returns, agg.net_payable);
    }

    #[test]
    fn top_seller_sums_across_dates() {
        let orders = vec![
            order(1, Some(A), date(2025, 1, 3), 5000),
            order(2, Some(A), date(2025, 1, 4), 7000),
        ];
        let agg = aggregate(&orders, &[], &[]);

        assert_eq!(
            agg.top_seller,
            Some(TopSeller {
                name: "A".to_string(),
                amount: BigDecimal::from(12000)
            })
        );
        assert_eq!(agg.orders_over_time.len(), 2);
        assert_eq!(agg.orders_over_time[0].date, date(2025, 1, 3));
        assert_eq!(agg.orders_over_time[0].label, "Jan 3");
        assert_eq!(agg.orders_over_time[1].amount, BigDecimal::from(7000));
    }

    #[test]
    fn top_seller_tie_keeps_first_seen() {
        let orders = vec![
            order(1, Some(B), date(2025, 1, 3), 4000),
            order(2, Some(A), date(2025, 1, 3), 4000),
        ];
        let agg = aggregate(&orders, &[], &[]);
        assert_eq!(agg.top_seller.unwrap().name, "B");
    }

    #[test]
    fn returns_only_seller_is_not_top_seller() {
        let orders = vec![order(1, Some(A), date(2025, 1, 3), 100)];
        let returns = vec![ret(B, date(2025, 1, 4), 1, 50)];
        let agg = aggregate(&orders, &[], &returns);

        assert_eq!(agg.top_seller.unwrap().name, "A");
        let b = agg.suppliers.iter().find(|s| s.seller == "B").unwrap();
        assert_eq!(b.revenue, BigDecimal::zero());
        assert_eq!(b.returns, BigDecimal::from(50));
    }

    #[test]
    fn missing_seller_is_bucketed_as_unknown() {
        let orders = vec![
            order(1, Some(A), date(2025, 1, 3), 1000),
            order(2, None, date(2025, 1, 3), 2500),
        ];
        let agg = aggregate(&orders, &[], &[]);

        assert_eq!(agg.gross_amount, BigDecimal::from(3500));
        let unknown = agg
            .suppliers
            .iter()
            .find(|s| s.seller == UNKNOWN_LABEL)
            .expect("unknown bucket");
        assert_eq!(unknown.revenue, BigDecimal::from(2500));
    }

    #[test]
    fn same_name_sellers_stay_separate() {
        let orders = vec![
            order(1, Some((1, "Acme")), date(2025, 1, 3), 100),
            order(2, Some((2, "Acme")), date(2025, 1, 3), 200),
        ];
        let agg = aggregate(&orders, &[], &[]);
        assert_eq!(agg.suppliers.len(), 2);
    }

    #[test]
    fn items_of_unfetched_orders_are_ignored() {
        let orders = vec![order(1, Some(A), date(2025, 1, 3), 2300)];
        let items = vec![item(1, HOODIE, 10, 230), item(99, HOODIE, 500, 230)];
        let agg = aggregate(&orders, &items, &[]);

        assert_eq!(agg.total_pieces, 10);
        assert_eq!(breakdown_sum(&agg), agg.gross_amount);
    }

    #[test]
    fn snapshot_price_prefers_most_frequent() {
        let orders = vec![
            order(1, Some(A), date(2025, 1, 3), 230),
            order(2, Some(A), date(2025, 1, 4), 250),
            order(3, Some(A), date(2025, 1, 5), 250),
        ];
        let items = vec![
            item(1, HOODIE, 1, 230),
            item(2, HOODIE, 1, 250),
            item(3, HOODIE, 1, 250),
        ];
        let agg = aggregate(&orders, &items, &[]);

        let hoodie = &agg.category_breakdown[0];
        assert_eq!(hoodie.price_per_piece, BigDecimal::from(250));
        assert_eq!(hoodie.subtotal, BigDecimal::from(730));
    }

    #[test]
    fn snapshot_price_tie_keeps_first_seen() {
        let orders = vec![order(1, Some(A), date(2025, 1, 3), 480)];
        let items = vec![item(1, HOODIE, 1, 230), item(1, HOODIE, 1, 250)];
        let agg = aggregate(&orders, &items, &[]);
        assert_eq!(agg.category_breakdown[0].price_per_piece, BigDecimal::from(230));
    }

    #[test]
    fn missing_category_is_bucketed_as_unknown() {
        let orders = vec![order(1, Some(A), date(2025, 1, 3), 500)];
        let mut orphan = item(1, HOODIE, 5, 100);
        orphan.category_id = None;
        orphan.category_name = None;
        let agg = aggregate(&orders, &[orphan], &[]);

        assert_eq!(agg.category_breakdown[0].name, UNKNOWN_LABEL);
        assert_eq!(agg.category_breakdown[0].category_id, None);
        assert_eq!(breakdown_sum(&agg), agg.gross_amount);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let orders = vec![
            order(1, Some(A), date(2025, 1, 3), 24500),
            order(2, Some(B), date(2025, 1, 8), 1300),
        ];
        let items = vec![
            item(1, HOODIE, 50, 230),
            item(1, SHIRT, 100, 130),
            item(2, SHIRT, 10, 130),
        ];
        let returns = vec![ret(B, date(2025, 1, 9), 2, 130)];

        let first = aggregate(&orders, &items, &returns);
        let second = aggregate(&orders, &items, &returns);
        assert_eq!(first, second);
    }
}
