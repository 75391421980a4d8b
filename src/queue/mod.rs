// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 提供任务队列、流水线上下文和目标调度功能
pub mod pipeline;
pub mod scheduler;
pub mod task_queue;
