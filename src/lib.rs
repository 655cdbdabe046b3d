//! # cnaddr - Chinese Shipping-Address Normalizer
//!
//! 中文收货地址清洗库：从一整段自由格式的地址文本里解析出标准省市区、
//! 街道详情、收件人、手机号，校验邮编一致性，并给出可投递性评估。
//!
//! ## 功能特性
//!
//! - 省市区标准化，支持口语简称（如 "杭州滨江" -> 杭州市/滨江区）
//! - 同名区县按大陆优先、上下文一致、别名长度依次裁决
//! - 抽取收件人、手机号、邮编，缺失时安全退化为 None
//! - 邮编与行政区交叉校验：同邮区采信用户邮编，冲突时降级并标记高风险
//! - 输出标准化中文地址和拼音地址，附带区县中心点坐标
//! - 可投递性启发式：置信度、是否缺户级细节、能否直接投递
//!
//! ## 快速开始
//!
//! ```rust
//! use cnaddr::AddressParser;
//!
//! let parser = AddressParser::new();
//!
//! let result = parser.parse("浙江省杭州市滨江区长河街道江南大道1234号 张三 15900001234");
//! assert_eq!(result.province, Some("浙江省".to_string()));
//! assert_eq!(result.city, Some("杭州市".to_string()));
//! assert_eq!(result.district, Some("滨江区".to_string()));
//! assert_eq!(result.recipient, Some("张三".to_string()));
//! assert_eq!(result.phone, Some("15900001234".to_string()));
//!
//! // 简称同样能解析
//! let result = parser.parse("杭州滨江江南大道1234号");
//! assert_eq!(result.city, Some("杭州市".to_string()));
//! ```
//!
//! 参考数据在进程内只构建一次；[`parse`] 走全局实例，
//! 解析本身是纯函数，可跨线程并发调用。

mod data;
mod division;
mod error;
mod extract;
mod parser;
mod trie;

pub use division::{DivisionCandidate, DivisionLevel, ParsedAddress};
pub use error::DataError;
pub use parser::AddressParser;

/// 便捷函数：使用全局解析器解析地址
///
/// ```rust
/// let result = cnaddr::parse("北京市朝阳区建国路88号");
/// assert_eq!(result.province, Some("北京市".to_string()));
/// assert_eq!(result.district, Some("朝阳区".to_string()));
/// ```
pub fn parse(address: &str) -> ParsedAddress {
    AddressParser::global().parse(address)
}

/// 便捷函数：批量解析地址
pub fn parse_batch(addresses: &[&str]) -> Vec<ParsedAddress> {
    AddressParser::global().parse_batch(addresses)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_level_parse() {
        let result = parse("广东省深圳市南山区科技园路1号 李四 13800138000");
        assert_eq!(result.province, Some("广东省".to_string()));
        assert_eq!(result.city, Some("深圳市".to_string()));
        assert_eq!(result.district, Some("南山区".to_string()));
        assert_eq!(result.recipient, Some("李四".to_string()));
        assert_eq!(result.phone, Some("13800138000".to_string()));
    }

    #[test]
    fn test_crate_level_parse_batch() {
        let results = parse_batch(&["北京市海淀区中关村大街27号", "上海市徐汇区漕溪北路88号"]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].district, Some("海淀区".to_string()));
        assert_eq!(results[1].district, Some("徐汇区".to_string()));
    }

    #[test]
    fn test_shared_global_instance() {
        let a = AddressParser::global() as *const AddressParser;
        let b = AddressParser::global() as *const AddressParser;
        assert_eq!(a, b);
    }
}
