//! 集計モジュール
//!
//! 生レコードから派生値（割合・期間バケット・倉庫別内訳・低在庫抽出）を計算する。
//! すべて純関数。不正な数値は0、欠けたラベルはプレースホルダで補い、
//! エラーにはしない。

use crate::format::{
    parse_date, MONTH_NAMES_ES, PLACEHOLDER_CATEGORY, PLACEHOLDER_NO_WAREHOUSE, PLACEHOLDER_WAREHOUSE,
};
use crate::types::{
    CategoryBreakdown, Event, EventAnalysis, Granularity, InventoryItem, PeriodBucket, RecordId,
    WarehouseReport, WarehouseSummary,
};
use chrono::Datelike;
use std::collections::{BTreeMap, HashMap};

/// 在庫カテゴリの表示順
pub const INVENTORY_CATEGORIES: &[&str] = &[
    "Manteleria",
    "Cubierto",
    "Loza",
    "Cristaleria",
    "Sillas",
    "Mesas",
    "Salas lounge",
    "Periqueras",
    "Carpas",
    "Pistas y tarimas",
    "Extras",
];

/// 小数第1位に丸める
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// 各値の合計に対する割合（%、小数第1位）
///
/// 合計が0なら全て0。丸め後の合計を100に補正しない。
pub fn percentages_of(quantities: &[f64]) -> Vec<f64> {
    let sum: f64 = quantities.iter().map(|&q| sanitize(q)).sum();
    quantities
        .iter()
        .map(|&q| {
            if sum > 0.0 {
                round1(100.0 * sanitize(q) / sum)
            } else {
                0.0
            }
        })
        .collect()
}

fn percentages_of_counts(counts: &[u64]) -> Vec<f64> {
    let values: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
    percentages_of(&values)
}

// ============================================
// 期間バケット
// ============================================

/// 時系列順に並ぶ期間キー
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct PeriodKey {
    year: i32,
    /// 月（1-12）または四半期（1-4）。年次は0
    index: u32,
}

impl PeriodKey {
    fn of(date: chrono::NaiveDate, granularity: Granularity) -> Self {
        let index = match granularity {
            Granularity::Monthly => date.month(),
            Granularity::Quarterly => (date.month() - 1) / 3 + 1,
            Granularity::Yearly => 0,
        };
        Self { year: date.year(), index }
    }

    fn label(&self, granularity: Granularity) -> String {
        match granularity {
            Granularity::Monthly => {
                let month = MONTH_NAMES_ES
                    .get(self.index.saturating_sub(1) as usize)
                    .copied()
                    .unwrap_or("");
                format!("{} {}", month, self.year)
            }
            Granularity::Quarterly => format!("Q{} {}", self.index, self.year),
            Granularity::Yearly => self.year.to_string(),
        }
    }
}

/// 開始日で期間ごとに件数を集計（時系列昇順）
///
/// 日付を解析できないイベントは集計から除外する。
pub fn bucket_by_period(events: &[Event], granularity: Granularity) -> Vec<PeriodBucket> {
    let mut counts: BTreeMap<PeriodKey, u64> = BTreeMap::new();
    let mut skipped = 0usize;

    for event in events {
        match parse_date(&event.fecha_inicio) {
            Some(date) => *counts.entry(PeriodKey::of(date, granularity)).or_insert(0) += 1,
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!("開始日を解析できないイベント{}件を期間集計から除外", skipped);
    }

    let values: Vec<u64> = counts.values().copied().collect();
    let percentages = percentages_of_counts(&values);

    counts
        .keys()
        .zip(values.iter().zip(percentages))
        .map(|(key, (&count, percentage))| PeriodBucket {
            period: key.label(granularity),
            count,
            percentage,
        })
        .collect()
}

/// 期間分析をまとめて作る
pub fn analyze_events(events: &[Event], granularity: Granularity) -> EventAnalysis {
    let periods = bucket_by_period(events, granularity);
    let total_events = periods.iter().map(|p| p.count).sum();
    EventAnalysis {
        granularity,
        periods,
        total_events,
    }
}

/// 件数が最大の期間（同数なら先頭）
pub fn busiest_period(periods: &[PeriodBucket]) -> Option<&PeriodBucket> {
    periods.iter().fold(None, |best: Option<&PeriodBucket>, p| match best {
        Some(b) if b.count >= p.count => Some(b),
        _ => Some(p),
    })
}

// ============================================
// 倉庫別集計
// ============================================

struct WarehouseAccumulator {
    id: RecordId,
    /// 倉庫IDを持たない在庫の寄せ集め
    unassigned: bool,
    nombre: String,
    ubicacion: String,
    categories: Vec<(String, u64)>,
}

impl WarehouseAccumulator {
    fn add(&mut self, category: &str, quantity: u64) {
        match self.categories.iter_mut().find(|(c, _)| c == category) {
            Some((_, total)) => *total = total.saturating_add(quantity),
            None => self.categories.push((category.to_string(), quantity)),
        }
    }

    /// 既定カテゴリ順 → 未知カテゴリは出現順
    fn ordered_categories(mut self) -> Vec<(String, u64)> {
        self.categories.sort_by_key(|(c, _)| {
            INVENTORY_CATEGORIES
                .iter()
                .position(|known| known == c)
                .unwrap_or(INVENTORY_CATEGORIES.len())
        });
        self.categories
    }
}

/// 倉庫ごと・カテゴリごとに数量を集計
///
/// 倉庫の割合は全体合計に対する値、カテゴリの割合はその倉庫の合計に対する値。
/// 倉庫IDの無い在庫は1つのグループ（"Sin bodega"）にまとめる。数量の合計は飽和加算。
pub fn summarize_warehouses(items: &[InventoryItem]) -> Vec<WarehouseSummary> {
    let mut order: Vec<Option<RecordId>> = Vec::new();
    let mut groups: HashMap<Option<RecordId>, WarehouseAccumulator> = HashMap::new();

    let unassigned = items.iter().filter(|item| item.bodega_id.is_none()).count();
    if unassigned > 0 {
        log::warn!("倉庫IDの無い在庫が{}件あります（{}に集計）", unassigned, PLACEHOLDER_NO_WAREHOUSE);
    }

    for item in items {
        let key = item.bodega_id.clone();
        let acc = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            WarehouseAccumulator {
                id: key.clone().unwrap_or_default(),
                unassigned: key.is_none(),
                nombre: String::new(),
                ubicacion: String::new(),
                categories: Vec::new(),
            }
        });
        if acc.nombre.is_empty() && !item.bodega_nombre.trim().is_empty() {
            acc.nombre = item.bodega_nombre.clone();
        }
        if acc.ubicacion.is_empty() && !item.bodega_ubicacion.trim().is_empty() {
            acc.ubicacion = item.bodega_ubicacion.clone();
        }
        let category = if item.categoria.trim().is_empty() {
            PLACEHOLDER_CATEGORY
        } else {
            item.categoria.as_str()
        };
        acc.add(category, item.cantidad_actual);
    }

    let accumulators: Vec<WarehouseAccumulator> = order
        .iter()
        .filter_map(|id| groups.remove(id))
        .collect();

    let totals: Vec<u64> = accumulators
        .iter()
        .map(|acc| acc.categories.iter().fold(0u64, |sum, (_, q)| sum.saturating_add(*q)))
        .collect();
    let warehouse_percentages = percentages_of_counts(&totals);

    accumulators
        .into_iter()
        .zip(totals.into_iter().zip(warehouse_percentages))
        .map(|(acc, (total_items, percentage))| {
            let id = acc.id.clone();
            let nombre = if !acc.nombre.is_empty() {
                acc.nombre.clone()
            } else if acc.unassigned {
                PLACEHOLDER_NO_WAREHOUSE.to_string()
            } else {
                PLACEHOLDER_WAREHOUSE.to_string()
            };
            let ubicacion = acc.ubicacion.clone();
            let categories = acc.ordered_categories();
            let quantities: Vec<u64> = categories.iter().map(|(_, q)| *q).collect();
            let category_percentages = percentages_of_counts(&quantities);

            WarehouseSummary {
                id,
                nombre,
                ubicacion,
                total_items,
                percentage,
                categories: categories
                    .into_iter()
                    .zip(category_percentages)
                    .map(|((categoria, cantidad), percentage)| CategoryBreakdown {
                        categoria,
                        cantidad,
                        percentage,
                    })
                    .collect(),
            }
        })
        .collect()
}

/// 全倉庫の合計数量
pub fn total_quantity(warehouses: &[WarehouseSummary]) -> u64 {
    warehouses.iter().fold(0u64, |sum, w| sum.saturating_add(w.total_items))
}

/// 倉庫レポートを作る
pub fn warehouse_report(items: &[InventoryItem]) -> WarehouseReport {
    let warehouses = summarize_warehouses(items);
    WarehouseReport {
        total_inventory: total_quantity(&warehouses),
        warehouses,
    }
}

/// 上流の倉庫レポートを倉庫×カテゴリの在庫行に展開
///
/// カテゴリが1件も無い倉庫も消えないよう数量0の行を残す。
pub fn flatten_warehouse_report(report: &WarehouseReport) -> Vec<InventoryItem> {
    report
        .warehouses
        .iter()
        .flat_map(|w| {
            let base = InventoryItem {
                bodega_id: Some(w.id.clone()),
                bodega_nombre: w.nombre.clone(),
                bodega_ubicacion: w.ubicacion.clone(),
                ..Default::default()
            };
            if w.categories.is_empty() {
                return vec![base];
            }
            w.categories
                .iter()
                .map(|c| InventoryItem {
                    categoria: c.categoria.clone(),
                    cantidad_actual: c.cantidad,
                    ..base.clone()
                })
                .collect()
        })
        .collect()
}

// ============================================
// 低在庫
// ============================================

/// 数量が閾値未満の品目（元の順序を保持）
pub fn filter_low_stock(items: &[InventoryItem], threshold: u64) -> Vec<InventoryItem> {
    items
        .iter()
        .filter(|item| item.cantidad_actual < threshold)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_on(date: &str) -> Event {
        Event {
            fecha_inicio: date.to_string(),
            ..Default::default()
        }
    }

    fn item(warehouse: u64, category: &str, quantity: u64) -> InventoryItem {
        InventoryItem {
            bodega_id: Some(RecordId::from(warehouse)),
            bodega_nombre: format!("Bodega {}", warehouse),
            categoria: category.to_string(),
            cantidad_actual: quantity,
            ..Default::default()
        }
    }

    #[test]
    fn test_percentages_basic() {
        assert_eq!(percentages_of(&[1.0, 1.0, 2.0]), vec![25.0, 25.0, 50.0]);
        assert_eq!(percentages_of(&[2.0, 1.0]), vec![66.7, 33.3]);
    }

    #[test]
    fn test_percentages_zero_sum() {
        assert_eq!(percentages_of(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
        assert!(percentages_of(&[]).is_empty());
    }

    #[test]
    fn test_percentages_drift_within_bounds() {
        let samples: Vec<Vec<f64>> = vec![
            vec![1.0, 1.0, 1.0],
            vec![3.0, 7.0, 11.0, 13.0, 17.0],
            vec![1.0; 7],
            vec![999.0, 1.0],
            vec![0.0, 5.0, 0.0],
        ];
        for q in samples {
            let p = percentages_of(&q);
            let sum: f64 = p.iter().sum();
            assert!((sum - 100.0).abs() <= 0.5 * q.len() as f64, "drift too large: {:?}", p);
            assert!(p.iter().all(|&v| (0.0..=100.0).contains(&v)));
        }
    }

    #[test]
    fn test_percentages_not_renormalized() {
        // 33.3 × 3 = 99.9 のまま
        let sum: f64 = percentages_of(&[1.0, 1.0, 1.0]).iter().sum();
        assert!((sum - 99.9).abs() < 1e-9);
    }

    #[test]
    fn test_percentages_malformed_as_zero() {
        assert_eq!(percentages_of(&[f64::NAN, 1.0, -3.0]), vec![0.0, 100.0, 0.0]);
    }

    #[test]
    fn test_bucket_monthly() {
        let events = vec![event_on("2024-01-05"), event_on("2024-01-20"), event_on("2024-02-01")];
        let buckets = bucket_by_period(&events, Granularity::Monthly);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].period, "Enero 2024");
        assert_eq!(buckets[0].count, 2);
        assert!((buckets[0].percentage - 66.7).abs() < 1e-9);
        assert_eq!(buckets[1].period, "Febrero 2024");
        assert_eq!(buckets[1].count, 1);
        assert!((buckets[1].percentage - 33.3).abs() < 1e-9);
    }

    #[test]
    fn test_bucket_chronological_across_years() {
        let events = vec![
            event_on("2025-02-01"),
            event_on("2023-12-31"),
            event_on("2024-11-15"),
            event_on("2024-02-10"),
        ];
        let quarterly = bucket_by_period(&events, Granularity::Quarterly);
        let labels: Vec<&str> = quarterly.iter().map(|b| b.period.as_str()).collect();
        assert_eq!(labels, vec!["Q4 2023", "Q1 2024", "Q4 2024", "Q1 2025"]);

        let yearly = bucket_by_period(&events, Granularity::Yearly);
        let labels: Vec<&str> = yearly.iter().map(|b| b.period.as_str()).collect();
        assert_eq!(labels, vec!["2023", "2024", "2025"]);
        assert_eq!(yearly[1].count, 2);
        assert!((yearly[1].percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_bucket_skips_undated() {
        let events = vec![event_on("2024-05-01"), event_on(""), event_on("sin fecha")];
        let analysis = analyze_events(&events, Granularity::Monthly);
        assert_eq!(analysis.periods.len(), 1);
        assert_eq!(analysis.total_events, 1);
        assert!((analysis.periods[0].percentage - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_busiest_period_first_wins_ties() {
        let periods = vec![
            PeriodBucket { period: "A".into(), count: 3, percentage: 0.0 },
            PeriodBucket { period: "B".into(), count: 5, percentage: 0.0 },
            PeriodBucket { period: "C".into(), count: 5, percentage: 0.0 },
        ];
        assert_eq!(busiest_period(&periods).map(|p| p.period.as_str()), Some("B"));
        assert!(busiest_period(&[]).is_none());
    }

    #[test]
    fn test_summarize_two_percentage_bases() {
        let items = vec![
            item(1, "Sillas", 30),
            item(1, "Manteleria", 10),
            item(2, "Mesas", 60),
            item(1, "Sillas", 20),
        ];
        let summaries = summarize_warehouses(&items);
        assert_eq!(summaries.len(), 2);

        let first = &summaries[0];
        assert_eq!(first.nombre, "Bodega 1");
        assert_eq!(first.total_items, 60);
        assert!((first.percentage - 50.0).abs() < 1e-9);
        // 既定順: Manteleria → Sillas
        assert_eq!(first.categories[0].categoria, "Manteleria");
        assert!((first.categories[0].percentage - 16.7).abs() < 1e-9);
        assert_eq!(first.categories[1].cantidad, 50);
        assert!((first.categories[1].percentage - 83.3).abs() < 1e-9);

        let second = &summaries[1];
        assert_eq!(second.total_items, 60);
        assert!((second.categories[0].percentage - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_summarize_invariants() {
        let items = vec![
            item(1, "Sillas", 7),
            item(1, "Loza", 0),
            item(1, "Carpas", 3),
            item(1, "Extras", 11),
            item(2, "Loza", 0),
        ];
        for w in summarize_warehouses(&items) {
            let category_sum: u64 = w.categories.iter().map(|c| c.cantidad).sum();
            assert!(category_sum <= w.total_items);
            if w.total_items > 0 {
                let pct: f64 = w.stocked_categories().map(|c| c.percentage).sum();
                let n = w.stocked_categories().count() as f64;
                assert!((pct - 100.0).abs() <= 0.5 * n);
            }
        }
    }

    #[test]
    fn test_summarize_missing_labels() {
        let items = vec![InventoryItem {
            bodega_id: Some(RecordId::from(3)),
            categoria: String::new(),
            cantidad_actual: 4,
            ..Default::default()
        }];
        let summaries = summarize_warehouses(&items);
        assert_eq!(summaries[0].nombre, "No especificada");
        assert_eq!(summaries[0].categories[0].categoria, "Sin categoría");
    }

    #[test]
    fn test_items_without_warehouse_grouped_separately() {
        let orphan = |category: &str, quantity: u64| InventoryItem {
            bodega_id: None,
            categoria: category.to_string(),
            cantidad_actual: quantity,
            ..Default::default()
        };
        let items = vec![
            item(1, "Loza", 6),
            orphan("Loza", 2),
            orphan("Sillas", 2),
            InventoryItem {
                bodega_id: Some(RecordId::default()),
                categoria: "Mesas".into(),
                cantidad_actual: 5,
                ..Default::default()
            },
        ];
        let summaries = summarize_warehouses(&items);
        assert_eq!(summaries.len(), 3);

        let unassigned = &summaries[1];
        assert_eq!(unassigned.nombre, "Sin bodega");
        assert_eq!(unassigned.total_items, 4);
        assert_eq!(unassigned.categories.len(), 2);
        // 空IDの倉庫とは混ざらない
        assert_eq!(summaries[2].nombre, "No especificada");
        assert_eq!(summaries[2].total_items, 5);
    }

    #[test]
    fn test_huge_quantities_saturate() {
        let items = vec![
            item(1, "Loza", u64::MAX),
            item(1, "Loza", u64::MAX),
            item(1, "Sillas", 1),
            item(2, "Mesas", u64::MAX),
        ];
        let report = warehouse_report(&items);
        assert_eq!(report.warehouses[0].categories[0].cantidad, u64::MAX);
        assert_eq!(report.warehouses[0].total_items, u64::MAX);
        assert_eq!(report.warehouses[1].total_items, u64::MAX);
        assert_eq!(report.total_inventory, u64::MAX);
        assert!((report.warehouses[0].percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_flatten_and_resummarize() {
        let report = WarehouseReport {
            total_inventory: 40,
            warehouses: vec![
                WarehouseSummary {
                    id: RecordId::from(1),
                    nombre: "Central".into(),
                    ubicacion: "Centro".into(),
                    total_items: 40,
                    percentage: 100.0,
                    categories: vec![
                        CategoryBreakdown { categoria: "Loza".into(), cantidad: 0, percentage: 0.0 },
                        CategoryBreakdown { categoria: "Sillas".into(), cantidad: 40, percentage: 100.0 },
                    ],
                },
                WarehouseSummary {
                    id: RecordId::from(2),
                    nombre: "Vacía".into(),
                    ..Default::default()
                },
            ],
        };
        let rebuilt = warehouse_report(&flatten_warehouse_report(&report));
        assert_eq!(rebuilt.total_inventory, 40);
        assert_eq!(rebuilt.warehouses.len(), 2);
        assert_eq!(rebuilt.warehouses[0].ubicacion, "Centro");
        assert_eq!(rebuilt.warehouses[0].stocked_categories().count(), 1);
        assert_eq!(rebuilt.warehouses[1].total_items, 0);
        assert_eq!(rebuilt.warehouses[1].percentage, 0.0);
    }

    #[test]
    fn test_filter_low_stock() {
        let items: Vec<InventoryItem> = [10u64, 25, 30, 5]
            .iter()
            .map(|&q| item(1, "Sillas", q))
            .collect();
        let low = filter_low_stock(&items, 25);
        let quantities: Vec<u64> = low.iter().map(|i| i.cantidad_actual).collect();
        assert_eq!(quantities, vec![10, 5]);
    }
}
