// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod baidu_classifier_test;
pub mod bilibili_client_test;
