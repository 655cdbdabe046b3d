//! 地址解析器核心实现

use crate::data::{self, DivisionIndex, EMBEDDED_DIVISIONS};
use crate::division::{DivisionCandidate, DivisionLevel, ParsedAddress};
use crate::error::DataError;
use crate::extract;
use once_cell::sync::Lazy;
use pinyin::ToPinyin;
use std::collections::HashSet;

/// 全局解析器实例
static GLOBAL_PARSER: Lazy<AddressParser> = Lazy::new(AddressParser::new);

/// 地址解析器
///
/// 持有一次性构建的只读索引；`parse` 是纯函数，可跨线程并发调用。
pub struct AddressParser {
    index: DivisionIndex,
}

/// 一次别名命中
struct AliasHit<'a> {
    alias_chars: usize,
    candidate: &'a DivisionCandidate,
}

/// 行政区候选排序键，按声明顺序逐项比较：
/// 大陆优先 > 候选的市在文本里出现过 > 别名更长更具体。
/// 键值相同时保留先注册的候选。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct RankKey {
    mainland: bool,
    city_in_text: bool,
    alias_chars: usize,
}

/// 行政区解析的中间状态
#[derive(Debug, Default)]
struct AdminResolution {
    province: Option<String>,
    city: Option<String>,
    district: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    /// 区县主邮编
    admin_postal: Option<String>,
}

impl AdminResolution {
    fn is_empty(&self) -> bool {
        self.province.is_none() && self.city.is_none() && self.district.is_none()
    }

    /// 候选与已解析字段逐项比对：双方都有值的字段必须一致
    fn agrees_with(&self, candidate: &DivisionCandidate) -> bool {
        let cand_city =
            data::fix_municipality_city(Some(&candidate.province), candidate.city.as_deref());
        let own_city = data::fix_municipality_city(self.province.as_deref(), self.city.as_deref());

        if self.province.is_some() && self.province.as_deref() != Some(candidate.province.as_str())
        {
            return false;
        }
        if own_city.is_some() && cand_city.is_some() && own_city != cand_city {
            return false;
        }
        if self.district.is_some()
            && candidate.district.is_some()
            && self.district != candidate.district
        {
            return false;
        }
        true
    }

    /// 用候选补齐仍为空的字段
    fn adopt_missing(&mut self, candidate: &DivisionCandidate) {
        if self.province.is_none() {
            self.province = Some(candidate.province.clone());
        }
        if self.city.is_none() {
            self.city = candidate.city.clone();
        }
        if self.district.is_none() {
            self.district = candidate.district.clone();
        }
        if self.lat.is_none() {
            self.lat = candidate.lat;
        }
        if self.lng.is_none() {
            self.lng = candidate.lng;
        }
        if self.admin_postal.is_none() {
            self.admin_postal = candidate.postal_code.clone();
        }
    }
}

/// 街道详细程度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetailLevel {
    None,
    /// 到楼：号楼/幢/栋/楼
    Building,
    /// 到户：单元/室/非楼栋的门牌号
    Unit,
}

impl AddressParser {
    /// 使用内嵌行政区划数据创建解析器
    pub fn new() -> Self {
        Self::from_json(EMBEDDED_DIVISIONS).expect("embedded division data is valid")
    }

    /// 从自定义 JSON 行政区划树创建解析器
    ///
    /// 数据格式：省 -> 市 -> 区县 的嵌套映射，各层带 `_pinyin` 音译键，
    /// 区县叶子为 `{_pinyin, postal_code, center: [lng, lat]}`。
    /// 测试可以用它注入合成数据。
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        Ok(Self {
            index: DivisionIndex::from_json(json)?,
        })
    }

    /// 获取全局解析器实例（进程内只构建一次）
    pub fn global() -> &'static AddressParser {
        &GLOBAL_PARSER
    }

    /// 解析一段自由格式的收货地址
    ///
    /// # 示例
    /// ```rust
    /// use cnaddr::AddressParser;
    ///
    /// let parser = AddressParser::new();
    /// let result = parser.parse("广东省深圳市南山区科技园路1号");
    /// assert_eq!(result.province, Some("广东省".to_string()));
    /// assert_eq!(result.district, Some("南山区".to_string()));
    /// ```
    pub fn parse(&self, address: &str) -> ParsedAddress {
        let cleaned = extract::clean_text(address);
        if cleaned.is_empty() {
            return ParsedAddress::empty();
        }

        let (rest, phone) = extract::extract_phone(&cleaned);
        let (rest, input_postal) = extract::extract_postal(&rest);
        let (rest, recipient) = extract::extract_recipient(&rest);
        let core = extract::strip_whitespace(&rest);

        let mut resolution = self.resolve_admin(&core);
        let (postal_code, postal_mismatch) =
            self.reconcile_postal(&mut resolution, input_postal.as_deref());
        resolution.city = data::fix_municipality_city(
            resolution.province.as_deref(),
            resolution.city.as_deref(),
        );

        let street = strip_admin_prefix(&core, &resolution);
        let (deliverable, confidence, needs_detail) = delivery_flags(
            resolution.district.is_some(),
            &street,
            phone.is_some(),
        );

        let normalized_cn = build_normalized_cn(
            resolution.province.as_deref(),
            resolution.city.as_deref(),
            resolution.district.as_deref(),
            &street,
        );
        let normalized_en = build_normalized_en(
            &street,
            resolution.district.as_deref(),
            resolution.city.as_deref(),
            resolution.province.as_deref(),
            postal_code.as_deref(),
        );

        tracing::debug!(
            province = resolution.province.as_deref(),
            city = resolution.city.as_deref(),
            district = resolution.district.as_deref(),
            postal_mismatch,
            confidence,
            "address parsed"
        );

        ParsedAddress {
            province: resolution.province,
            city: resolution.city,
            district: resolution.district,
            street,
            input_postal,
            postal_code,
            postal_mismatch,
            lat: resolution.lat,
            lng: resolution.lng,
            recipient,
            phone,
            normalized_cn,
            normalized_en,
            deliverable,
            confidence,
            needs_detail,
        }
    }

    /// 批量解析地址
    pub fn parse_batch(&self, addresses: &[&str]) -> Vec<ParsedAddress> {
        addresses.iter().map(|a| self.parse(a)).collect()
    }

    /// 检查地址是否有效（至少能解析出省或市）
    pub fn is_valid_address(&self, address: &str) -> bool {
        let result = self.parse(address);
        result.province.is_some() || result.city.is_some()
    }

    /// 所有省份，按数据顺序
    pub fn provinces(&self) -> &[String] {
        &self.index.provinces
    }

    /// 某省份下的所有城市
    pub fn cities_of_province(&self, province: &str) -> &[String] {
        self.index
            .province_cities
            .get(province)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 某城市下的所有区县
    pub fn districts_of_city(&self, city: &str) -> &[String] {
        self.index
            .city_districts
            .get(city)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 行政区解析：收集全部别名命中，再按 区县 -> 城市 -> 区县兜底 -> 省
    /// 的顺序逐级确定
    fn resolve_admin(&self, core: &str) -> AdminResolution {
        let mut hits: Vec<AliasHit> = Vec::new();
        let mut text_provinces: HashSet<&str> = HashSet::new();
        let mut text_cities: HashSet<&str> = HashSet::new();

        for alias in self.index.alias_hits(core) {
            for candidate in self.index.candidates_for(alias) {
                match candidate.level {
                    DivisionLevel::Province => {
                        text_provinces.insert(candidate.province.as_str());
                    }
                    DivisionLevel::City => {
                        if let Some(city) = &candidate.city {
                            text_cities.insert(city.as_str());
                        }
                    }
                    DivisionLevel::District => {}
                }
                hits.push(AliasHit {
                    alias_chars: alias.chars().count(),
                    candidate,
                });
            }
        }

        let mut resolution = AdminResolution::default();

        // 区县命中最具体，先用它
        let picked = select_best(
            hits.iter().filter(|h| {
                h.candidate.level == DivisionLevel::District
                    && (text_provinces.is_empty()
                        || text_provinces.contains(h.candidate.province.as_str()))
            }),
            &text_cities,
        );
        if let Some(candidate) = picked {
            resolution.adopt_missing(candidate);
        }

        // 城市命中，限定在已解析的省（或文本里出现过的省）内
        if resolution.city.is_none() {
            let province = resolution.province.clone();
            let picked = select_best(
                hits.iter().filter(|h| {
                    h.candidate.level == DivisionLevel::City
                        && match province.as_deref() {
                            Some(p) => h.candidate.province == p,
                            None => {
                                text_provinces.is_empty()
                                    || text_provinces.contains(h.candidate.province.as_str())
                            }
                        }
                }),
                &text_cities,
            );
            if let Some(candidate) = picked {
                resolution.adopt_missing(candidate);
            }
        }

        // 第二次区县查找，限定在已解析的省市内
        if resolution.district.is_none() {
            let province = resolution.province.clone();
            let city = resolution.city.clone();
            let picked = select_best(
                hits.iter().filter(|h| {
                    h.candidate.level == DivisionLevel::District
                        && province
                            .as_deref()
                            .map_or(true, |p| h.candidate.province == p)
                        && city
                            .as_deref()
                            .map_or(true, |c| h.candidate.city.as_deref() == Some(c))
                }),
                &text_cities,
            );
            if let Some(candidate) = picked {
                resolution.adopt_missing(candidate);
            }
        }

        // 省级兜底
        if resolution.province.is_none() {
            let picked = select_best(
                hits.iter()
                    .filter(|h| h.candidate.level == DivisionLevel::Province),
                &text_cities,
            );
            if let Some(candidate) = picked {
                resolution.adopt_missing(candidate);
            }
        }

        resolution.city = data::fix_municipality_city(
            resolution.province.as_deref(),
            resolution.city.as_deref(),
        );
        resolution
    }

    /// 邮编决策：同区判断 + 最终推荐邮编与冲突标记
    ///
    /// 同区的两条路径：精确邮编反查与解析行政区一致；或区县主邮编和
    /// 用户邮编前三位（市级邮区）一致，街道级精细邮编不该被误判。
    fn reconcile_postal(
        &self,
        resolution: &mut AdminResolution,
        input_postal: Option<&str>,
    ) -> (Option<String>, bool) {
        let mut same_area = false;
        let mut conflict = false;

        if let Some(input) = input_postal {
            if let Some(candidate) = self.index.postal_index.get(input) {
                if resolution.agrees_with(candidate) {
                    same_area = true;
                    resolution.adopt_missing(candidate);
                } else {
                    conflict = true;
                }
            } else if let Some(candidates) = input
                .get(..3)
                .and_then(|p| self.index.postal_prefix_index.get(p))
            {
                let picked = best_prefix_candidate(resolution, candidates);
                if let Some(candidate) = picked {
                    if resolution.is_empty() {
                        resolution.adopt_missing(candidate);
                    } else if resolution.agrees_with(candidate) {
                        if resolution.admin_postal.is_none() {
                            resolution.admin_postal = candidate.postal_code.clone();
                        }
                    } else {
                        conflict = true;
                    }
                }
            }
        }

        if !same_area {
            if let (Some(admin), Some(input)) = (resolution.admin_postal.as_deref(), input_postal)
            {
                if same_postal_family(admin, input) {
                    same_area = true;
                }
            }
        }

        match (input_postal, resolution.admin_postal.clone()) {
            (Some(input), _) if same_area => (Some(input.to_string()), false),
            (Some(_), Some(admin)) => (Some(admin), true),
            (None, Some(admin)) => (Some(admin), false),
            (Some(input), None) if !conflict => {
                let mismatch = resolution
                    .province
                    .as_deref()
                    .is_some_and(|p| !data::is_mainland_province(Some(p)));
                (Some(input.to_string()), mismatch)
            }
            (Some(_), None) => {
                // 冲突且没有区县主邮编：降级到省级兜底
                let fallback = resolution
                    .province
                    .as_deref()
                    .and_then(|p| self.index.province_fallback.get(p));
                match fallback {
                    Some(candidate) => {
                        if resolution.lat.is_none() {
                            resolution.lat = candidate.lat;
                        }
                        if resolution.lng.is_none() {
                            resolution.lng = candidate.lng;
                        }
                        (candidate.postal_code.clone(), true)
                    }
                    None => (None, true),
                }
            }
            (None, None) => (None, false),
        }
    }
}

impl Default for AddressParser {
    fn default() -> Self {
        Self::new()
    }
}

/// 按排序键挑最优候选，键值相同保留先出现的
fn select_best<'a>(
    hits: impl Iterator<Item = &'a AliasHit<'a>>,
    text_cities: &HashSet<&str>,
) -> Option<&'a DivisionCandidate> {
    let mut best: Option<(&DivisionCandidate, RankKey)> = None;
    for hit in hits {
        let key = RankKey {
            mainland: data::is_mainland_province(Some(&hit.candidate.province)),
            city_in_text: hit
                .candidate
                .city
                .as_deref()
                .is_some_and(|c| text_cities.contains(c)),
            alias_chars: hit.alias_chars,
        };
        match best {
            Some((_, best_key)) if key <= best_key => {}
            _ => best = Some((hit.candidate, key)),
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// 邮区候选排序：省一致 > 市一致 > 有区县 > 大陆优先
fn best_prefix_candidate<'a>(
    resolution: &AdminResolution,
    candidates: &'a [DivisionCandidate],
) -> Option<&'a DivisionCandidate> {
    let mut best: Option<(&DivisionCandidate, (bool, bool, bool, bool))> = None;
    for candidate in candidates {
        let key = (
            resolution.province.as_deref() == Some(candidate.province.as_str()),
            candidate.city.is_some() && resolution.city == candidate.city,
            candidate.district.is_some(),
            data::is_mainland_province(Some(&candidate.province)),
        );
        match best {
            Some((_, best_key)) if key <= best_key => {}
            _ => best = Some((candidate, key)),
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// 前三位标识地级市/邮区，一致即认为同城投递段
fn same_postal_family(a: &str, b: &str) -> bool {
    a.len() >= 3 && b.len() >= 3 && a.as_bytes()[..3] == b.as_bytes()[..3]
}

/// 从残余文本**开头**反复剥掉已解析行政区名及其简称
///
/// 只剥前缀，保留中段出现的地名（如包含省名的高校名）。
fn strip_admin_prefix(core: &str, resolution: &AdminResolution) -> String {
    let mut aliases: Vec<String> = Vec::new();
    for name in [
        resolution.province.as_deref(),
        resolution.city.as_deref(),
        resolution.district.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        for alias in data::generate_aliases(name) {
            if !aliases.contains(&alias) {
                aliases.push(alias);
            }
        }
    }
    aliases.sort_by_key(|a| std::cmp::Reverse(a.chars().count()));

    let mut street = core;
    loop {
        let mut stripped = false;
        for alias in &aliases {
            if let Some(rest) = street.strip_prefix(alias.as_str()) {
                street = rest;
                stripped = true;
                break;
            }
        }
        if !stripped {
            break;
        }
    }
    street.trim().to_string()
}

fn detail_level(street: &str) -> DetailLevel {
    if street.contains("单元") || street.contains('室') || has_door_number(street) {
        return DetailLevel::Unit;
    }
    if ["号楼", "幢", "栋", "楼"].iter().any(|m| street.contains(m)) {
        return DetailLevel::Building;
    }
    DetailLevel::None
}

/// "号"后面不是"楼"才算到户门牌
fn has_door_number(street: &str) -> bool {
    let chars: Vec<char> = street.chars().collect();
    chars
        .iter()
        .enumerate()
        .any(|(i, c)| *c == '号' && chars.get(i + 1) != Some(&'楼'))
}

/// 可投递性、置信度、是否缺户级细节
fn delivery_flags(has_district: bool, street: &str, has_phone: bool) -> (bool, f64, bool) {
    let level = detail_level(street);

    let mut confidence: f64 = 0.6;
    if has_district {
        confidence += 0.2;
    }
    match level {
        DetailLevel::Unit => confidence += 0.15,
        DetailLevel::Building => confidence += 0.05,
        DetailLevel::None => {}
    }
    if !has_phone {
        confidence -= 0.1;
    }
    confidence = confidence.clamp(0.0, 0.99);
    confidence = (confidence * 100.0).round() / 100.0;

    let needs_detail = level != DetailLevel::Unit;
    let deliverable =
        has_district && level == DetailLevel::Unit && has_phone && confidence >= 0.8;

    (deliverable, confidence, needs_detail)
}

/// 标准化中文地址：省 + 市（与省相同则省略）+ 区 + 街道，直接拼接
fn build_normalized_cn(
    province: Option<&str>,
    city: Option<&str>,
    district: Option<&str>,
    street: &str,
) -> String {
    let mut result = String::new();
    if let Some(p) = province {
        result.push_str(p);
    }
    if let Some(c) = city {
        if province != Some(c) {
            result.push_str(c);
        }
    }
    if let Some(d) = district {
        result.push_str(d);
    }
    result.push_str(street);
    result
}

/// 拼音化：汉字转成空格分隔的音节，数字/字母串原样保留
fn romanize(text: &str) -> String {
    let mut tokens: Vec<String> = Vec::new();
    let mut pending = String::new();
    for (ch, syllable) in text.chars().zip(text.to_pinyin()) {
        match syllable {
            Some(p) => {
                if !pending.is_empty() {
                    tokens.push(std::mem::take(&mut pending));
                }
                tokens.push(p.plain().to_string());
            }
            None if ch.is_whitespace() => {
                if !pending.is_empty() {
                    tokens.push(std::mem::take(&mut pending));
                }
            }
            None => pending.push(ch),
        }
    }
    if !pending.is_empty() {
        tokens.push(pending);
    }
    tokens.join(" ")
}

/// 拼音化地址：街道、区、市（与省相同则省略）、省、邮编、国别
fn build_normalized_en(
    street: &str,
    district: Option<&str>,
    city: Option<&str>,
    province: Option<&str>,
    postal_code: Option<&str>,
) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !street.is_empty() {
        parts.push(romanize(street));
    }
    if let Some(d) = district {
        parts.push(romanize(d));
    }
    if let Some(c) = city {
        if province != Some(c) {
            parts.push(romanize(c));
        }
    }
    if let Some(p) = province {
        parts.push(romanize(p));
    }
    if let Some(code) = postal_code {
        parts.push(code.to_string());
    }
    parts.push("China".to_string());
    parts.retain(|p| !p.is_empty());
    parts.join(", ")
}
