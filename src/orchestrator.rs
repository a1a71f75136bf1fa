//! 访问单元解密编排.
//!
//! 每路流持有一个 [`CencOrchestrator`]. 视频访问单元按以下顺序处理:
//!
//! 1. 判断描述符来源: 容器已给出完整信息时进入 [`ModeState::ModeResolved`], 之后直接沿用容器描述符
//! 2. 否则在带内定位并解码 CEI, 计算子样本布局 (可能移除防竞争字节, 缓冲区变短)
//! 3. 持锁读取解密配置并调用外部服务一次
//!
//! 解析失败只影响当前访问单元: 记录告警后按整帧明文交给服务.
//! 服务返回的失败原样上抛, 不重试.
//!
//! 同一个编排器的 `decrypt_*` 不应并发调用: 解密服务可能依赖调用顺序,
//! 调用方需按访问单元顺序串行提交. 配置锁只保护配置本身与服务调用.

use std::sync::{Arc, Mutex, MutexGuard};

use bytes::BytesMut;
use ceinfo_codec::{compute_audio_layout, compute_video_layout, decode_cei, locate_cei};
use ceinfo_core::{
    BufferHandle, CencDescriptor, CencError, CencResult, CodingType, DescriptorMode,
};
use tracing::{debug, info, warn};

use crate::config::StreamOptions;
use crate::service::{DecryptConfig, DecryptService};

/// 描述符来源状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeState {
    /// 尚未确定, 每个访问单元都做带内解析
    #[default]
    ModeUnset,
    /// 容器已提供完整描述符, 不再做带内解析
    ModeResolved,
}

/// 单路流的解密编排器
#[derive(Debug)]
pub struct CencOrchestrator {
    coding_type: CodingType,
    mode: ModeState,
    config: Mutex<Option<DecryptConfig>>,
}

impl CencOrchestrator {
    /// 按解码器名称创建
    pub fn new(codec_name: &str) -> Self {
        let coding_type = CodingType::from_codec_name(codec_name);
        debug!("创建解密编排器: codec={codec_name}, coding_type={coding_type}");
        Self {
            coding_type,
            mode: ModeState::default(),
            config: Mutex::new(None),
        }
    }

    /// 按流配置创建
    pub fn from_options(options: &StreamOptions) -> Self {
        Self::new(&options.codec_name)
    }

    /// 按流配置创建, 并设置解密服务
    pub fn with_service(
        options: &StreamOptions,
        service: Arc<dyn DecryptService>,
    ) -> CencResult<Self> {
        let orchestrator = Self::from_options(options);
        orchestrator.set_decrypt_config(service, options.secure_video_path)?;
        Ok(orchestrator)
    }

    /// 当前编码类型
    pub fn coding_type(&self) -> CodingType {
        self.coding_type
    }

    /// 当前描述符来源状态
    pub fn mode(&self) -> ModeState {
        self.mode
    }

    /// 更换解码器名称, 同时重置描述符来源状态
    pub fn set_codec_name(&mut self, codec_name: &str) {
        self.coding_type = CodingType::from_codec_name(codec_name);
        self.reset_mode();
        info!(
            "解码器名称变更: codec={codec_name}, coding_type={}",
            self.coding_type
        );
    }

    /// 重置描述符来源状态 (如 seek 或切换流后)
    pub fn reset_mode(&mut self) {
        self.mode = ModeState::ModeUnset;
    }

    /// 设置解密服务与安全视频通路标志
    ///
    /// 可与正在进行的解密并发调用, 新配置从下一次服务调用起生效.
    pub fn set_decrypt_config(
        &self,
        service: Arc<dyn DecryptService>,
        secure_video_path: bool,
    ) -> CencResult<()> {
        let mut guard = self.lock_config()?;
        *guard = Some(DecryptConfig::new(service, secure_video_path));
        debug!("解密配置已更新: svp={secure_video_path}");
        Ok(())
    }

    /// 是否已设置解密服务
    pub fn is_configured(&self) -> bool {
        self.lock_config().map(|guard| guard.is_some()).unwrap_or(false)
    }

    /// 解析视频访问单元, 得到交给服务的描述符
    ///
    /// 不调用解密服务. 需要移除防竞争字节时 `au` 会被截短.
    pub fn resolve_video(
        &mut self,
        au: &mut BytesMut,
        container: Option<&CencDescriptor>,
    ) -> CencResult<CencDescriptor> {
        let container_supplied =
            container.is_some_and(|desc| desc.mode == DescriptorMode::ContainerSupplied);
        if container_supplied && self.mode == ModeState::ModeUnset {
            self.mode = ModeState::ModeResolved;
            info!("{}: 容器提供完整 CENC 信息, 停止带内解析", self.coding_type);
        }

        if self.mode == ModeState::ModeResolved {
            return match container {
                Some(desc) => Ok(*desc),
                None => clear_descriptor(au.len(), DescriptorMode::ContainerSupplied),
            };
        }

        if !self.coding_type.supports_in_band() {
            debug!(
                "{}: 不支持带内 CENC 信息, 按明文处理, len={}",
                self.coding_type,
                au.len()
            );
            return clear_descriptor(au.len(), DescriptorMode::InBandRequired);
        }

        let base = container
            .copied()
            .unwrap_or_else(|| CencDescriptor::new(DescriptorMode::InBandRequired));
        match self.parse_in_band(au, base) {
            Ok(desc) => Ok(desc),
            Err(err) if err.is_parse_error() => {
                warn!(
                    "{}: CEI 解析失败, 本帧按明文处理, len={}, err={err}",
                    self.coding_type,
                    au.len()
                );
                clear_descriptor(au.len(), DescriptorMode::InBandRequired)
            }
            Err(err) => Err(err),
        }
    }

    /// 解析并解密视频访问单元
    ///
    /// `input.length` 会更新为处理后的访问单元长度. 返回交给服务的描述符.
    pub fn decrypt_video(
        &mut self,
        au: &mut BytesMut,
        container: Option<&CencDescriptor>,
        mut input: BufferHandle,
        output: &BufferHandle,
    ) -> CencResult<CencDescriptor> {
        self.ensure_configured()?;
        let desc = self.resolve_video(au, container)?;
        input.length = u32::try_from(au.len()).map_err(|_| {
            CencError::InvalidArgument(format!("访问单元长度超出 u32 范围, len={}", au.len()))
        })?;
        self.invoke(&desc, &input, output)?;
        Ok(desc)
    }

    /// 解析音频访问单元, 得到交给服务的描述符
    ///
    /// 音频不携带带内信息: 容器描述符缺少子样本时按算法计算, 无容器描述符则整段明文.
    pub fn resolve_audio(
        &self,
        len: usize,
        container: Option<&CencDescriptor>,
    ) -> CencResult<CencDescriptor> {
        let Some(base) = container else {
            return clear_descriptor(len, DescriptorMode::ContainerSupplied);
        };
        let mut desc = *base;
        if desc.subsamples().is_empty() {
            let layout = compute_audio_layout(len, desc.algorithm)?;
            desc.set_subsamples(layout.subsamples())?;
        }
        Ok(desc)
    }

    /// 解析并解密音频访问单元
    pub fn decrypt_audio(
        &self,
        data: &[u8],
        container: Option<&CencDescriptor>,
        input: &BufferHandle,
        output: &BufferHandle,
    ) -> CencResult<CencDescriptor> {
        self.ensure_configured()?;
        let desc = self.resolve_audio(data.len(), container)?;
        self.invoke(&desc, input, output)?;
        Ok(desc)
    }

    fn parse_in_band(
        &self,
        au: &mut BytesMut,
        base: CencDescriptor,
    ) -> CencResult<CencDescriptor> {
        let coding_type = self.coding_type;
        let Some(location) = locate_cei(au, coding_type) else {
            debug!("{coding_type}: 未找到 CEI, 按明文处理, len={}", au.len());
            return clear_descriptor(au.len(), DescriptorMode::InBandRequired);
        };

        let cei = decode_cei(location.region(au), coding_type)?;
        if !cei.is_encrypted() {
            debug!("{coding_type}: CEI 标记未加密, len={}", au.len());
            return clear_descriptor(au.len(), DescriptorMode::InBandRequired);
        }

        let mut desc = base;
        desc.mode = DescriptorMode::InBandRequired;
        cei.apply_to(&mut desc)?;

        let layout = compute_video_layout(au, coding_type, cei.is_ambiguous())?;
        desc.set_subsamples(layout.subsamples())?;
        debug!(
            "{coding_type}: 带内 CENC 信息: algorithm={}, subsamples={:?}, len={}",
            desc.algorithm,
            desc.subsamples(),
            au.len()
        );
        Ok(desc)
    }

    fn ensure_configured(&self) -> CencResult<()> {
        if self.lock_config()?.is_none() {
            return Err(CencError::NotConfigured(
                "解密前需先调用 set_decrypt_config".into(),
            ));
        }
        Ok(())
    }

    fn invoke(
        &self,
        desc: &CencDescriptor,
        input: &BufferHandle,
        output: &BufferHandle,
    ) -> CencResult<()> {
        let guard = self.lock_config()?;
        let config = guard.as_ref().ok_or_else(|| {
            CencError::NotConfigured("解密前需先调用 set_decrypt_config".into())
        })?;
        config
            .service
            .decrypt_media_data(config.secure_video_path, desc, input, output)
            .map_err(|code| {
                warn!("解密服务返回失败: code={code}, algorithm={}", desc.algorithm);
                CencError::Service {
                    code,
                    message: format!("decrypt_media_data 失败, algorithm={}", desc.algorithm),
                }
            })
    }

    fn lock_config(&self) -> CencResult<MutexGuard<'_, Option<DecryptConfig>>> {
        self.config
            .lock()
            .map_err(|_| CencError::Internal("解密配置锁已中毒".into()))
    }
}

fn clear_descriptor(len: usize, mode: DescriptorMode) -> CencResult<CencDescriptor> {
    let len = u32::try_from(len)
        .map_err(|_| CencError::InvalidArgument(format!("访问单元长度超出 u32 范围, len={len}")))?;
    Ok(CencDescriptor::clear(len, mode))
}
