//! 行政区划数据加载和索引构建

use crate::division::DivisionCandidate;
use crate::error::DataError;
use crate::trie::Trie;
use std::collections::{HashMap, HashSet};

/// 内嵌的省市区数据（编译时包含）
pub const EMBEDDED_DIVISIONS: &str = include_str!("../data/divisions_cn.json");

/// 树里的音译键，构建索引时跳过
const TRANSLITERATION_KEY: &str = "_pinyin";

/// 直辖市列表
pub const MUNICIPALITIES: [&str; 4] = ["北京市", "上海市", "天津市", "重庆市"];

/// 直辖市数据里可能出现的占位"市"名
const CITY_PLACEHOLDERS: [&str; 4] = ["市辖区", "市辖县", "县", "区"];

/// 常见行政后缀，按字符数从长到短，用来生成口语简称
const COMMON_SUFFIXES: [&str; 21] = [
    "维吾尔自治区",
    "特别行政区",
    "壮族自治区",
    "回族自治区",
    "自治区",
    "自治州",
    "开发区",
    "高新区",
    "街道",
    "新区",
    "地区",
    "盟",
    "州",
    "省",
    "市",
    "区",
    "县",
    "旗",
    "镇",
    "乡",
    "村",
];

/// 大陆省级行政区名称前缀白名单
///
/// 不含台湾/香港/澳门：同名区县做并列候选时，大陆候选优先。
const MAINLAND_WHITELIST_PREFIX: [&str; 31] = [
    "北京",
    "上海",
    "天津",
    "重庆",
    "河北",
    "山西",
    "辽宁",
    "吉林",
    "黑龙江",
    "江苏",
    "浙江",
    "安徽",
    "福建",
    "江西",
    "山东",
    "河南",
    "湖北",
    "湖南",
    "广东",
    "广西",
    "海南",
    "四川",
    "贵州",
    "云南",
    "西藏",
    "陕西",
    "甘肃",
    "青海",
    "宁夏",
    "新疆",
    "内蒙古",
];

const MAINLAND_KEYWORDS: [&str; 4] = ["特别行政区", "自治区", "省", "市"];

/// 判断省级名称是否属于大陆白名单
pub fn is_mainland_province(name: Option<&str>) -> bool {
    let Some(name) = name else {
        return false;
    };
    if MAINLAND_WHITELIST_PREFIX
        .iter()
        .any(|p| name.starts_with(p))
    {
        return true;
    }
    if MAINLAND_KEYWORDS.iter().any(|k| name.contains(k)) {
        return !(name.contains("香港") || name.contains("澳门") || name.contains("台湾"));
    }
    false
}

/// 直辖市修正：省是直辖市而市缺失或为占位名时，市 = 省
pub fn fix_municipality_city(province: Option<&str>, city: Option<&str>) -> Option<String> {
    if let Some(p) = province {
        if MUNICIPALITIES.contains(&p) {
            match city {
                None => return Some(p.to_string()),
                Some(c) if CITY_PLACEHOLDERS.contains(&c) => return Some(p.to_string()),
                _ => {}
            }
        }
    }
    city.map(str::to_string)
}

/// 根据正式行政区名生成口语简称
///
/// '北京市' -> ["北京市", "北京"]，'浦东新区' -> ["浦东新区", "浦东", "浦东新"]。
/// 剥掉后缀后不足两个字的变体丢弃（避免"市"、"区"这类单字别名）。
pub fn generate_aliases(name: &str) -> Vec<String> {
    let mut aliases = vec![name.to_string()];
    for suffix in COMMON_SUFFIXES {
        if let Some(stem) = name.strip_suffix(suffix) {
            if stem.chars().count() >= 2 && !aliases.iter().any(|a| a == stem) {
                aliases.push(stem.to_string());
            }
        }
    }
    aliases
}

/// 人工别名补充：数据树覆盖不到的口语叫法
fn manual_alias_overrides() -> Vec<(&'static str, DivisionCandidate)> {
    vec![(
        "北京沙河",
        DivisionCandidate::district_level(
            "北京市",
            "北京市",
            "昌平区",
            Some("102200".to_string()),
            Some(40.220660),
            Some(116.231204),
        ),
    )]
}

/// 人工邮编补充：片区精细投递邮编，树里只有区级主邮编
fn manual_postal_overrides() -> Vec<(&'static str, DivisionCandidate)> {
    vec![(
        "102206",
        DivisionCandidate::district_level(
            "北京市",
            "北京市",
            "昌平区",
            Some("102206".to_string()),
            Some(40.220660),
            Some(116.231204),
        ),
    )]
}

/// 四张只读索引 + 别名扫描树
///
/// 进程生命周期内构建一次，之后只读共享。
pub struct DivisionIndex {
    /// 别名 -> 候选行政区列表（同名区县会有多条）
    pub alias_index: HashMap<String, Vec<DivisionCandidate>>,
    /// 6 位邮编 -> 候选（先注册者优先）
    pub postal_index: HashMap<String, DivisionCandidate>,
    /// 邮编前 3 位（邮区）-> 候选列表
    pub postal_prefix_index: HashMap<String, Vec<DivisionCandidate>>,
    /// 省 -> 兜底候选（该省第一个注册的区县）
    pub province_fallback: HashMap<String, DivisionCandidate>,
    /// 所有省份，按数据顺序
    pub provinces: Vec<String>,
    /// 省份 -> 城市列表
    pub province_cities: HashMap<String, Vec<String>>,
    /// 城市 -> 区县列表
    pub city_districts: HashMap<String, Vec<String>>,
    /// 别名扫描树，值为别名本身
    alias_trie: Trie<String>,
}

impl DivisionIndex {
    /// 从 JSON 行政区划树构建索引
    ///
    /// 树结构：省 -> 市 -> 区县，每层带 `_pinyin` 音译键，
    /// 区县叶子为 `{_pinyin, postal_code, center: [lng, lat]}`，
    /// `postal_code`/`center` 缺失时字段保持 None。
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let tree: serde_json::Value = serde_json::from_str(json)?;
        let tree = tree.as_object().ok_or(DataError::Empty)?;
        if tree.is_empty() {
            return Err(DataError::Empty);
        }

        let mut alias_index: HashMap<String, Vec<DivisionCandidate>> = HashMap::new();
        let mut postal_index: HashMap<String, DivisionCandidate> = HashMap::new();
        let mut postal_prefix_index: HashMap<String, Vec<DivisionCandidate>> = HashMap::new();
        let mut province_fallback: HashMap<String, DivisionCandidate> = HashMap::new();
        let mut provinces = Vec::new();
        let mut province_cities: HashMap<String, Vec<String>> = HashMap::new();
        let mut city_districts: HashMap<String, Vec<String>> = HashMap::new();

        for (prov_name, prov_val) in tree {
            let Some(prov_obj) = prov_val.as_object() else {
                continue;
            };
            provinces.push(prov_name.clone());
            for alias in generate_aliases(prov_name) {
                alias_index
                    .entry(alias)
                    .or_default()
                    .push(DivisionCandidate::province_level(prov_name));
            }

            for (city_name, city_val) in prov_obj {
                if city_name == TRANSLITERATION_KEY {
                    continue;
                }
                let Some(city_obj) = city_val.as_object() else {
                    continue;
                };
                province_cities
                    .entry(prov_name.clone())
                    .or_default()
                    .push(city_name.clone());
                for alias in generate_aliases(city_name) {
                    alias_index
                        .entry(alias)
                        .or_default()
                        .push(DivisionCandidate::city_level(prov_name, city_name));
                }

                for (dist_name, dist_val) in city_obj {
                    if dist_name == TRANSLITERATION_KEY {
                        continue;
                    }
                    let Some(dist_obj) = dist_val.as_object() else {
                        continue;
                    };

                    let postal_code = dist_obj
                        .get("postal_code")
                        .and_then(|v| v.as_str())
                        .map(str::to_string);
                    let center = dist_obj.get("center").and_then(|v| v.as_array());
                    let lng = center
                        .and_then(|c| c.first())
                        .and_then(|v| v.as_f64());
                    let lat = center
                        .and_then(|c| c.get(1))
                        .and_then(|v| v.as_f64());

                    let candidate = DivisionCandidate::district_level(
                        prov_name,
                        city_name,
                        dist_name,
                        postal_code.clone(),
                        lat,
                        lng,
                    );

                    city_districts
                        .entry(city_name.clone())
                        .or_default()
                        .push(dist_name.clone());
                    for alias in generate_aliases(dist_name) {
                        alias_index
                            .entry(alias)
                            .or_default()
                            .push(candidate.clone());
                    }

                    if let Some(code) = &postal_code {
                        postal_index
                            .entry(code.clone())
                            .or_insert_with(|| candidate.clone());
                        if let Some(prefix) = code.get(..3) {
                            postal_prefix_index
                                .entry(prefix.to_string())
                                .or_default()
                                .push(candidate.clone());
                        }
                    }

                    province_fallback
                        .entry(prov_name.clone())
                        .or_insert_with(|| candidate.clone());
                }
            }
        }

        for (alias, candidate) in manual_alias_overrides() {
            alias_index
                .entry(alias.to_string())
                .or_default()
                .push(candidate);
        }
        for (code, candidate) in manual_postal_overrides() {
            postal_index.entry(code.to_string()).or_insert(candidate);
        }

        let mut alias_trie = Trie::new();
        for alias in alias_index.keys() {
            alias_trie.insert(alias, alias.clone());
        }

        tracing::debug!(
            provinces = provinces.len(),
            aliases = alias_index.len(),
            postals = postal_index.len(),
            prefixes = postal_prefix_index.len(),
            "division index built"
        );

        Ok(Self {
            alias_index,
            postal_index,
            postal_prefix_index,
            province_fallback,
            provinces,
            province_cities,
            city_districts,
            alias_trie,
        })
    }

    /// 扫描文本，返回命中的别名（去重）
    pub fn alias_hits(&self, text: &str) -> Vec<&str> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut hits = Vec::new();
        for alias in self.alias_trie.scan(text) {
            if seen.insert(alias) {
                hits.push(alias.as_str());
            }
        }
        hits
    }

    /// 某个别名的全部候选
    pub fn candidates_for(&self, alias: &str) -> &[DivisionCandidate] {
        self.alias_index
            .get(alias)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::division::DivisionLevel;

    fn index() -> DivisionIndex {
        DivisionIndex::from_json(EMBEDDED_DIVISIONS).unwrap()
    }

    #[test]
    fn test_generate_aliases() {
        assert_eq!(generate_aliases("北京市"), vec!["北京市", "北京"]);
        assert_eq!(generate_aliases("昌平区"), vec!["昌平区", "昌平"]);
        assert_eq!(generate_aliases("高唐县"), vec!["高唐县", "高唐"]);
        assert_eq!(
            generate_aliases("浦东新区"),
            vec!["浦东新区", "浦东", "浦东新"]
        );
        assert_eq!(
            generate_aliases("广西壮族自治区"),
            vec!["广西壮族自治区", "广西", "广西壮族", "广西壮族自治"]
        );
        // 剥后缀后只剩单字的丢弃
        assert_eq!(generate_aliases("吴县"), vec!["吴县"]);
    }

    #[test]
    fn test_mainland_whitelist() {
        assert!(is_mainland_province(Some("浙江省")));
        assert!(is_mainland_province(Some("北京市")));
        assert!(is_mainland_province(Some("内蒙古自治区")));
        assert!(!is_mainland_province(Some("台湾省")));
        assert!(!is_mainland_province(Some("香港特别行政区")));
        assert!(!is_mainland_province(None));
    }

    #[test]
    fn test_fix_municipality_city() {
        assert_eq!(
            fix_municipality_city(Some("北京市"), None),
            Some("北京市".to_string())
        );
        assert_eq!(
            fix_municipality_city(Some("上海市"), Some("市辖区")),
            Some("上海市".to_string())
        );
        assert_eq!(
            fix_municipality_city(Some("浙江省"), Some("杭州市")),
            Some("杭州市".to_string())
        );
        assert_eq!(fix_municipality_city(None, None), None);
    }

    #[test]
    fn test_index_build() {
        let idx = index();
        assert!(idx.provinces.len() >= 15);
        assert!(idx.provinces.contains(&"浙江省".to_string()));

        // 别名命中同名区县的多条候选
        let chaoyang = idx.candidates_for("朝阳区");
        assert_eq!(chaoyang.len(), 2);
        assert!(chaoyang.iter().all(|c| c.level == DivisionLevel::District));
        assert_eq!(chaoyang[0].province, "北京市");
        assert_eq!(chaoyang[1].province, "吉林省");

        // 短别名同样注册
        assert!(!idx.candidates_for("滨江").is_empty());
        assert!(idx.candidates_for("不存在的地名").is_empty());
    }

    #[test]
    fn test_postal_index_first_wins() {
        let idx = index();
        // 999077 在香港岛下注册了两个区，先注册的中西区保留
        let hk = idx.postal_index.get("999077").unwrap();
        assert_eq!(hk.district.as_deref(), Some("中西区"));
        assert_eq!(hk.province, "香港特别行政区");
    }

    #[test]
    fn test_postal_prefix_index() {
        let idx = index();
        let hangzhou = idx.postal_prefix_index.get("310").unwrap();
        assert!(hangzhou.len() >= 3);
        assert!(hangzhou.iter().all(|c| c.city.as_deref() == Some("杭州市")));
    }

    #[test]
    fn test_province_fallback_is_first_district() {
        let idx = index();
        // 辽宁省第一个注册的区县是沈阳市和平区
        let liaoning = idx.province_fallback.get("辽宁省").unwrap();
        assert_eq!(liaoning.city.as_deref(), Some("沈阳市"));
        assert_eq!(liaoning.postal_code.as_deref(), Some("110001"));
    }

    #[test]
    fn test_manual_overrides() {
        let idx = index();
        let shahe = idx.candidates_for("北京沙河");
        assert_eq!(shahe.len(), 1);
        assert_eq!(shahe[0].district.as_deref(), Some("昌平区"));

        let fine = idx.postal_index.get("102206").unwrap();
        assert_eq!(fine.district.as_deref(), Some("昌平区"));
        assert_eq!(fine.postal_code.as_deref(), Some("102206"));
    }

    #[test]
    fn test_alias_hits_scan() {
        let idx = index();
        let hits = idx.alias_hits("浙江省杭州市滨江区长河街道");
        assert!(hits.contains(&"浙江省"));
        assert!(hits.contains(&"浙江"));
        assert!(hits.contains(&"杭州市"));
        assert!(hits.contains(&"滨江区"));
    }

    #[test]
    fn test_bad_data_is_fatal() {
        assert!(DivisionIndex::from_json("not json").is_err());
        assert!(DivisionIndex::from_json("[]").is_err());
        assert!(DivisionIndex::from_json("{}").is_err());
    }
}
