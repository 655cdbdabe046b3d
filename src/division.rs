//! 行政区划与解析结果数据结构

use serde::Serialize;

/// 行政级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DivisionLevel {
    /// 省、直辖市、自治区、特别行政区
    Province,
    /// 地级市、自治州等
    City,
    /// 区、县、县级市、旗
    District,
}

/// 别名/邮编索引中的候选行政区
///
/// 每条候选都带完整的省市区上下文，区级候选额外携带主邮编和中心点坐标。
#[derive(Debug, Clone, PartialEq)]
pub struct DivisionCandidate {
    pub level: DivisionLevel,
    pub province: String,
    /// 省级候选为 None
    pub city: Option<String>,
    /// 省/市级候选为 None
    pub district: Option<String>,
    /// 区级主邮编（数据缺失时为 None）
    pub postal_code: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl DivisionCandidate {
    pub fn province_level(province: impl Into<String>) -> Self {
        Self {
            level: DivisionLevel::Province,
            province: province.into(),
            city: None,
            district: None,
            postal_code: None,
            lat: None,
            lng: None,
        }
    }

    pub fn city_level(province: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            level: DivisionLevel::City,
            province: province.into(),
            city: Some(city.into()),
            district: None,
            postal_code: None,
            lat: None,
            lng: None,
        }
    }

    pub fn district_level(
        province: impl Into<String>,
        city: impl Into<String>,
        district: impl Into<String>,
        postal_code: Option<String>,
        lat: Option<f64>,
        lng: Option<f64>,
    ) -> Self {
        Self {
            level: DivisionLevel::District,
            province: province.into(),
            city: Some(city.into()),
            district: Some(district.into()),
            postal_code,
            lat,
            lng,
        }
    }
}

/// 地址解析结果
///
/// 每次调用新建一份，返回后不再共享或修改；可直接序列化为响应体。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedAddress {
    /// 省级行政区，例如 浙江省 / 北京市
    pub province: Option<String>,
    /// 地级市；直辖市会复制省名，例如 北京市
    pub city: Option<String>,
    /// 区/县，例如 滨江区 / 高唐县
    pub district: Option<String>,
    /// 去掉省市区及其简称后的街道、小区、楼栋、门牌等
    pub street: String,
    /// 用户原始地址里提取到的邮编
    pub input_postal: Option<String>,
    /// 最终推荐使用的邮编
    pub postal_code: Option<String>,
    /// 用户邮编与解析行政区是否冲突（高风险单）
    pub postal_mismatch: bool,
    /// 区县级中心点纬度
    pub lat: Option<f64>,
    /// 区县级中心点经度
    pub lng: Option<f64>,
    /// 推测的收件人姓名
    pub recipient: Option<String>,
    /// 推测的大陆手机号
    pub phone: Option<String>,
    /// 标准化中文整串地址
    pub normalized_cn: String,
    /// 拼音化地址，适合跨境面单
    pub normalized_en: String,
    /// 是否看起来可直接投递
    pub deliverable: bool,
    /// 0~0.99 置信度
    pub confidence: f64,
    /// 是否缺少单元/室等户级信息
    pub needs_detail: bool,
}

impl ParsedAddress {
    /// 创建空的解析结果
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_province(&self) -> bool {
        self.province.is_some()
    }

    pub fn has_city(&self) -> bool {
        self.city.is_some()
    }

    pub fn has_district(&self) -> bool {
        self.district.is_some()
    }

    /// 省市区是否全部解析出来
    pub fn is_complete(&self) -> bool {
        self.province.is_some() && self.city.is_some() && self.district.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_constructors() {
        let p = DivisionCandidate::province_level("浙江省");
        assert_eq!(p.level, DivisionLevel::Province);
        assert_eq!(p.city, None);

        let c = DivisionCandidate::city_level("浙江省", "杭州市");
        assert_eq!(c.level, DivisionLevel::City);
        assert_eq!(c.district, None);

        let d = DivisionCandidate::district_level(
            "浙江省",
            "杭州市",
            "滨江区",
            Some("310051".to_string()),
            Some(30.208735),
            Some(120.211544),
        );
        assert_eq!(d.level, DivisionLevel::District);
        assert_eq!(d.district.as_deref(), Some("滨江区"));
        assert_eq!(d.postal_code.as_deref(), Some("310051"));
    }

    #[test]
    fn test_parsed_address_helpers() {
        let mut addr = ParsedAddress::empty();
        assert!(!addr.is_complete());

        addr.province = Some("浙江省".to_string());
        addr.city = Some("杭州市".to_string());
        addr.district = Some("滨江区".to_string());
        assert!(addr.has_province() && addr.has_city() && addr.has_district());
        assert!(addr.is_complete());
    }

    #[test]
    fn test_serialize_flat() {
        let addr = ParsedAddress {
            province: Some("北京市".to_string()),
            street: "建国路88号".to_string(),
            postal_mismatch: false,
            confidence: 0.85,
            ..ParsedAddress::empty()
        };
        let json = serde_json::to_value(&addr).unwrap();
        assert_eq!(json["province"], "北京市");
        assert_eq!(json["street"], "建国路88号");
        assert_eq!(json["city"], serde_json::Value::Null);
        assert_eq!(json["postal_mismatch"], false);
    }
}
