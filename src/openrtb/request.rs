use serde::{Deserialize, Deserializer, Serialize};

/// JSON `null` 按零值处理，与字段缺失一致
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `imp` 为 `null` 时视为空数组，数组中的 `null` 元素视为空 `Imp`
fn imp_list<'de, D>(deserializer: D) -> Result<Vec<Imp>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Option::<Vec<Option<Imp>>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items.into_iter().map(Option::unwrap_or_default).collect())
}

/// OpenRTB BidRequest 结构体（线上格式）
///
/// 只建模校验需要的字段，其余字段在解析时忽略（向前兼容）。
/// `id`、`imp` 缺失时按空值处理，由校验器报告为缺少字段，而不是 JSON 错误。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BidRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    /// 广告展示请求列表
    #[serde(default, deserialize_with = "imp_list")]
    pub imp: Vec<Imp>,

    /// 设备信息：线上可选，业务上必填
    #[serde(default)]
    pub device: Option<Device>,
}

/// 单个广告位（impression），目前只关心 id
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Imp {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
}

/// 设备信息，目前只关心 User-Agent
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Device {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ua: String,
}

/// 通过校验的 BidRequest
///
/// 只能由 `bidding::validator` 构造：`id` 非空、`imp` 非空且每个 id 非空、
/// `device` 一定存在且 `ua` 非空。
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBidRequest {
    id: String,
    imp: Vec<Imp>,
    device: Device,
}

impl ValidatedBidRequest {
    pub(crate) fn new(id: String, imp: Vec<Imp>, device: Device) -> Self {
        debug_assert!(!imp.is_empty());
        Self { id, imp, device }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn imp(&self) -> &[Imp] {
        &self.imp
    }

    /// 第一个广告位；校验保证至少有一个
    pub fn first_imp(&self) -> &Imp {
        &self.imp[0]
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}
