use std::time::Duration;

/// 一个整数序列
pub type IntSequence = Vec<i64>;

/// 一次请求提交的一批整数序列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    pub arrays: Vec<IntSequence>,
}

impl Batch {
    pub fn new(arrays: Vec<IntSequence>) -> Self {
        Self { arrays }
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// 所有序列的元素总数（仅用于日志）
    pub fn total_elements(&self) -> usize {
        self.arrays.iter().map(Vec::len).sum()
    }
}

impl From<Vec<IntSequence>> for Batch {
    fn from(arrays: Vec<IntSequence>) -> Self {
        Self::new(arrays)
    }
}

/// 排序后的一批序列及整批耗时
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedBatch {
    pub arrays: Vec<IntSequence>,
    pub elapsed: Duration,
}

impl SortedBatch {
    /// 耗时（纳秒）
    pub fn elapsed_nanos(&self) -> u128 {
        self.elapsed.as_nanos()
    }
}
