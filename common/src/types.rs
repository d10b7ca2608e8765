//! レコード型定義
//!
//! 上流APIのJSONをそのまま受け取る型:
//! - Event / Tasting: 家具割当(FurnitureAssignment)を子に持つ
//! - InventoryItem / MaintenanceEntry: 在庫系の行
//! - WarehouseReport / EventAnalysis: 集計結果の入れ物
//!
//! 数値フィールドは寛容にデコードする（不正値は0）。

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// ドメイン内で一意な不透明ID（数値・文字列どちらも受け付ける）
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self(match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        }))
    }
}

// ============================================
// 寛容デコード
// ============================================

/// JSON値を非負の数量に変換（不正値は0）
pub fn quantity_from_value(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(non_negative_round))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(non_negative_round).unwrap_or(0),
        _ => 0,
    }
}

fn non_negative_round(f: f64) -> Option<u64> {
    if f.is_finite() && f >= 0.0 {
        Some(f.round() as u64)
    } else {
        None
    }
}

/// JSON値を割合に変換（不正値は0.0）
pub fn ratio_from_value(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0),
        Value::String(s) => s
            .trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(quantity_from_value(&value))
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(ratio_from_value(&value))
}

/// null・欠落・不正値はNone
fn lenient_opt_u64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<u64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::Null => None,
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(non_negative_round)),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(non_negative_round),
        _ => None,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================
// レコード
// ============================================

/// イベント種別
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventType {
    pub id: RecordId,
    #[serde(deserialize_with = "lenient_string")]
    pub nombre: String,
    pub descripcion: Option<String>,
}

/// イベント/試食会に割り当てられた家具
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FurnitureAssignment {
    #[serde(deserialize_with = "lenient_string")]
    pub content_type_name: String,   // カテゴリ
    #[serde(deserialize_with = "lenient_string")]
    pub producto_nombre: String,     // 商品
    #[serde(deserialize_with = "lenient_u64")]
    pub cantidad: u64,
}

/// イベント
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    pub id: RecordId,
    #[serde(deserialize_with = "lenient_string")]
    pub nombre: String,
    #[serde(deserialize_with = "lenient_string")]
    pub responsable: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub cantidad_personas: u64,
    #[serde(deserialize_with = "lenient_string")]
    pub lugar: String,
    /// "YYYY-MM-DD"（日時文字列も可）
    #[serde(deserialize_with = "lenient_string")]
    pub fecha_inicio: String,
    #[serde(deserialize_with = "lenient_string")]
    pub hora_inicio: String,
    #[serde(deserialize_with = "lenient_string")]
    pub estado: String,
    pub tipo_evento: Option<RecordId>,
    #[serde(deserialize_with = "lenient_string")]
    pub tipo_evento_nombre: String,
    #[serde(deserialize_with = "null_as_default")]
    pub mobiliario_asignado: Vec<FurnitureAssignment>,
}

/// 試食会（デグスタシオン）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tasting {
    pub id: RecordId,
    #[serde(deserialize_with = "lenient_string")]
    pub nombre: String,
    #[serde(deserialize_with = "lenient_string")]
    pub responsable: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub cantidad_personas: u64,
    #[serde(deserialize_with = "lenient_string")]
    pub alimentos: String,
    #[serde(deserialize_with = "lenient_string")]
    pub fecha_degustacion: String,
    #[serde(deserialize_with = "lenient_string")]
    pub hora_degustacion: String,
    #[serde(deserialize_with = "lenient_string")]
    pub fecha_evento: String,
    #[serde(deserialize_with = "lenient_string")]
    pub estado: String,
    #[serde(deserialize_with = "null_as_default")]
    pub mobiliario_asignado: Vec<FurnitureAssignment>,
}

/// 在庫品目（低在庫レポート・倉庫集計の入力）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryItem {
    pub id: RecordId,
    #[serde(deserialize_with = "lenient_string")]
    pub categoria: String,
    #[serde(deserialize_with = "lenient_string")]
    pub nombre: String,
    #[serde(deserialize_with = "lenient_string")]
    pub descripcion: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub cantidad_actual: u64,
    #[serde(deserialize_with = "lenient_opt_u64")]
    pub stock_minimo: Option<u64>,
    pub bodega_id: Option<RecordId>,
    #[serde(deserialize_with = "lenient_string")]
    pub bodega_nombre: String,
    #[serde(deserialize_with = "lenient_string")]
    pub bodega_ubicacion: String,
    #[serde(deserialize_with = "lenient_string")]
    pub tipo: String,
}

/// メンテナンス記録（直近30日）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceEntry {
    pub id: RecordId,
    #[serde(deserialize_with = "lenient_string")]
    pub categoria: String,
    #[serde(deserialize_with = "lenient_string")]
    pub nombre: String,
    #[serde(deserialize_with = "lenient_string")]
    pub descripcion: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub cantidad_en_mantenimiento: u64,
    #[serde(deserialize_with = "lenient_u64")]
    pub cantidad_disponible: u64,
    #[serde(deserialize_with = "lenient_string")]
    pub estado: String,
    #[serde(deserialize_with = "lenient_string")]
    pub bodega_nombre: String,
    pub fecha: Option<String>,
}

// ============================================
// 集計結果
// ============================================

/// カテゴリ別内訳（割合は倉庫自身の合計に対する値）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryBreakdown {
    #[serde(deserialize_with = "lenient_string")]
    pub categoria: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub cantidad: u64,
    #[serde(deserialize_with = "lenient_f64")]
    pub percentage: f64,
}

/// 倉庫別サマリ（割合は全体合計に対する値）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseSummary {
    pub id: RecordId,
    #[serde(deserialize_with = "lenient_string")]
    pub nombre: String,
    #[serde(deserialize_with = "lenient_string")]
    pub ubicacion: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub total_items: u64,
    #[serde(deserialize_with = "lenient_f64")]
    pub percentage: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub categories: Vec<CategoryBreakdown>,
}

impl WarehouseSummary {
    /// 数量が0のカテゴリを除いた内訳
    pub fn stocked_categories(&self) -> impl Iterator<Item = &CategoryBreakdown> {
        self.categories.iter().filter(|c| c.cantidad > 0)
    }
}

/// 倉庫レポート
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseReport {
    #[serde(deserialize_with = "lenient_u64")]
    pub total_inventory: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub warehouses: Vec<WarehouseSummary>,
}

impl WarehouseReport {
    pub fn is_empty(&self) -> bool {
        self.warehouses.is_empty()
    }
}

/// 期間バケット
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodBucket {
    #[serde(deserialize_with = "lenient_string")]
    pub period: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub count: u64,
    #[serde(deserialize_with = "lenient_f64")]
    pub percentage: f64,
}

/// 期間分析レスポンスに含まれるイベント
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisEvent {
    pub id: RecordId,
    #[serde(deserialize_with = "lenient_string")]
    pub nombre: String,
    #[serde(deserialize_with = "lenient_string")]
    pub fecha: String,
    #[serde(deserialize_with = "lenient_string")]
    pub responsable: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub cantidad_personas: u64,
}

impl From<AnalysisEvent> for Event {
    fn from(e: AnalysisEvent) -> Self {
        Event {
            id: e.id,
            nombre: e.nombre,
            responsable: e.responsable,
            cantidad_personas: e.cantidad_personas,
            fecha_inicio: e.fecha,
            ..Default::default()
        }
    }
}

/// 期間分析レスポンスの1期間
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisPeriodPayload {
    #[serde(deserialize_with = "lenient_string")]
    pub period: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub events: Vec<AnalysisEvent>,
}

/// 期間分析レスポンス（上流の形そのまま）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventAnalysisPayload {
    #[serde(deserialize_with = "lenient_string")]
    pub period_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub periods: Vec<AnalysisPeriodPayload>,
    #[serde(deserialize_with = "lenient_u64")]
    pub total_events: u64,
}

impl EventAnalysisPayload {
    /// 期間ごとのイベントを平坦化
    pub fn into_events(self) -> Vec<Event> {
        self.periods
            .into_iter()
            .flat_map(|p| p.events.into_iter().map(Event::from))
            .collect()
    }
}

/// 期間分析（クライアント側で再集計したもの）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventAnalysis {
    pub granularity: Granularity,
    pub periods: Vec<PeriodBucket>,
    pub total_events: u64,
}

impl EventAnalysis {
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// 期間の粒度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl Granularity {
    /// クエリパラメータ・ファイル名用
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Monthly => "monthly",
            Granularity::Quarterly => "quarterly",
            Granularity::Yearly => "yearly",
        }
    }

    /// 帳票表示用
    pub fn label(&self) -> &'static str {
        match self {
            Granularity::Monthly => "Mensual",
            Granularity::Quarterly => "Trimestral",
            Granularity::Yearly => "Anual",
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" | "mensual" | "m" => Ok(Granularity::Monthly),
            "quarterly" | "trimestral" | "q" => Ok(Granularity::Quarterly),
            "yearly" | "anual" | "y" => Ok(Granularity::Yearly),
            _ => Err(format!("Unknown period: {}. Use monthly, quarterly, or yearly", s)),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON配列をレコード列として読み込む
///
/// 配列以外（エラー応答のオブジェクトなど）は空として扱う。
pub fn parse_collection<T: DeserializeOwned>(json: &str, what: &str) -> Result<Vec<T>> {
    let value: Value = serde_json::from_str(json).map_err(|source| Error::payload(what, source))?;
    if !value.is_array() {
        log::warn!("{}のレスポンスが配列ではありません。空として扱います", what);
        return Ok(Vec::new());
    }
    serde_json::from_value(value).map_err(|source| Error::payload(what, source))
}

/// JSONオブジェクトを読み込む（null は既定値）
pub fn parse_payload<T: DeserializeOwned + Default>(json: &str, what: &str) -> Result<T> {
    let value: Value = serde_json::from_str(json).map_err(|source| Error::payload(what, source))?;
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value).map_err(|source| Error::payload(what, source))
}
