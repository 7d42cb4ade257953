//! Result triage
//!
//! Splits the ranked matches into three display buckets. The default policy is a plain
//! one-third split; a category-aware policy can replace it through [`TriagePolicy`].

use serde::Serialize;

use super::SearchResultRef;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketKind {
    /// 搜索结果
    Primary,
    /// 相似商品
    Similar,
    /// 推荐
    Recommended,
}

/// 三个互不重叠、保持输入顺序的结果分组
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TriageBuckets {
    pub primary: Vec<SearchResultRef>,
    pub similar: Vec<SearchResultRef>,
    pub recommended: Vec<SearchResultRef>,
}

impl TriageBuckets {
    pub fn bucket(&self, kind: BucketKind) -> &[SearchResultRef] {
        match kind {
            BucketKind::Primary => &self.primary,
            BucketKind::Similar => &self.similar,
            BucketKind::Recommended => &self.recommended,
        }
    }

    pub fn len(&self) -> usize {
        self.primary.len() + self.similar.len() + self.recommended.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// primary, similar, recommended 顺序拼接后的迭代
    pub fn iter(&self) -> impl Iterator<Item = &SearchResultRef> {
        self.primary
            .iter()
            .chain(self.similar.iter())
            .chain(self.recommended.iter())
    }
}

pub trait TriagePolicy: Send + Sync {
    fn triage(&self, results: Vec<SearchResultRef>) -> TriageBuckets;
}

/// First `ceil(N/3)` are primary, up to `ceil(2N/3)` similar, the rest recommended.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThirdsTriage;

impl TriagePolicy for ThirdsTriage {
    fn triage(&self, mut results: Vec<SearchResultRef>) -> TriageBuckets {
        let (first, second) = split_points(results.len());

        let recommended = results.split_off(second);
        let similar = results.split_off(first);
        TriageBuckets {
            primary: results,
            similar,
            recommended,
        }
    }
}

pub fn split_points(n: usize) -> (usize, usize) {
    (n.div_ceil(3), (2 * n).div_ceil(3))
}
