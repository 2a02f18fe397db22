use crossbeam_channel::{Receiver, Sender};
use ember_renderer::render_settings::MsaaLevel;

/// 输入层发给帧循环的命令，每次迭代开始时统一处理
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderCommand {
    /// 切换 MSAA 等级，会触发渲染资源的完整重建
    SetMsaa(MsaaLevel),
    /// 开关光源绕 -Y 轴的旋转动画
    ToggleLightOrbit,
    Exit,
}

pub fn render_command_channel() -> (Sender<RenderCommand>, Receiver<RenderCommand>) {
    crossbeam_channel::unbounded()
}

/// 一次迭代中积压的命令合并后的结果
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PendingCommands {
    /// 只保留最后一次 MSAA 请求
    pub msaa: Option<MsaaLevel>,
    /// 奇数次切换才生效
    pub toggle_light_orbit: bool,
    pub exit: bool,
}
impl PendingCommands {
    /// 非阻塞地取出 channel 中的所有命令
    pub fn drain(receiver: &Receiver<RenderCommand>) -> Self {
        let mut pending = Self::default();
        for command in receiver.try_iter() {
            match command {
                RenderCommand::SetMsaa(level) => pending.msaa = Some(level),
                RenderCommand::ToggleLightOrbit => pending.toggle_light_orbit = !pending.toggle_light_orbit,
                RenderCommand::Exit => pending.exit = true,
            }
        }
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_keeps_last_msaa_request() {
        let (tx, rx) = render_command_channel();
        tx.send(RenderCommand::SetMsaa(MsaaLevel::X2)).unwrap();
        tx.send(RenderCommand::SetMsaa(MsaaLevel::X8)).unwrap();

        let pending = PendingCommands::drain(&rx);
        assert_eq!(pending.msaa, Some(MsaaLevel::X8));
        assert!(!pending.exit);
        assert_eq!(PendingCommands::drain(&rx), PendingCommands::default());
    }

    #[test]
    fn exit_is_sticky_within_one_drain() {
        let (tx, rx) = render_command_channel();
        tx.send(RenderCommand::Exit).unwrap();
        tx.send(RenderCommand::SetMsaa(MsaaLevel::X4)).unwrap();

        let pending = PendingCommands::drain(&rx);
        assert!(pending.exit);
        assert_eq!(pending.msaa, Some(MsaaLevel::X4));
    }

    #[test]
    fn light_orbit_toggles_cancel_in_pairs() {
        let (tx, rx) = render_command_channel();
        tx.send(RenderCommand::ToggleLightOrbit).unwrap();
        assert!(PendingCommands::drain(&rx).toggle_light_orbit);

        tx.send(RenderCommand::ToggleLightOrbit).unwrap();
        tx.send(RenderCommand::ToggleLightOrbit).unwrap();
        assert!(!PendingCommands::drain(&rx).toggle_light_orbit);

        for _ in 0..3 {
            tx.send(RenderCommand::ToggleLightOrbit).unwrap();
        }
        assert!(PendingCommands::drain(&rx).toggle_light_orbit);
    }
}
