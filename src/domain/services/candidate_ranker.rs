// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::record::CandidateSource;

/// 候选排序器
///
/// 过滤掉规模过小的内容源，按热度降序稳定排序，并截断到候选上限
#[derive(Debug, Clone)]
pub struct CandidateRanker {
    /// 规模信号下限
    pub min_source_size: u64,
    /// 每个关键字最多考虑的候选数
    pub max_candidates: usize,
}

impl CandidateRanker {
    pub fn new(min_source_size: u64, max_candidates: usize) -> Self {
        Self {
            min_source_size,
            max_candidates,
        }
    }

    pub fn rank(&self, sources: Vec<CandidateSource>) -> Vec<CandidateSource> {
        let mut ranked: Vec<CandidateSource> = sources
            .into_iter()
            .filter(|s| s.size_signal >= self.min_source_size)
            .collect();
        // sort_by 是稳定排序，热度相同保持原顺序
        ranked.sort_by(|a, b| b.popularity_or_zero().cmp(&a.popularity_or_zero()));
        ranked.truncate(self.max_candidates);
        ranked
    }
}
