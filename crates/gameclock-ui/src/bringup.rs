//! Display bring-up sequencer
//!
//! Drives a [`PanelBackend`] through the fixed hardware handshake:
//!
//! 1. backlight enable
//! 2. bus init
//! 3. panel IO attach
//! 4. panel driver attach
//! 5. reset
//! 6. init
//! 7. orientation
//! 8. power on
//! 9. rendering port attach
//!
//! Each stage has its own transition function. The first failure stops the
//! sequence for good; nothing is retried or rolled back.

use cyd_panel::{
    BusConfig, Config, DrawBuffer, ErrorCode, PanelBackend, PanelDevConfig, PanelIoConfig,
    PortGeometry,
};

use crate::port::RenderingPort;

/// One step of the bring-up sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    BacklightEnable,
    BusInit,
    PanelIoAttach,
    PanelDriverAttach,
    Reset,
    Init,
    Orientation,
    PowerOn,
    RenderingPortAttach,
}

impl Stage {
    /// Every stage in execution order
    pub const ALL: [Stage; 9] = [
        Stage::BacklightEnable,
        Stage::BusInit,
        Stage::PanelIoAttach,
        Stage::PanelDriverAttach,
        Stage::Reset,
        Stage::Init,
        Stage::Orientation,
        Stage::PowerOn,
        Stage::RenderingPortAttach,
    ];

    /// 1-based position in the sequence
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    pub fn next(self) -> Option<Stage> {
        Self::ALL.get(self as usize + 1).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::BacklightEnable => "backlight enable",
            Stage::BusInit => "bus init",
            Stage::PanelIoAttach => "panel IO attach",
            Stage::PanelDriverAttach => "panel driver attach",
            Stage::Reset => "reset",
            Stage::Init => "init",
            Stage::Orientation => "orientation",
            Stage::PowerOn => "power on",
            Stage::RenderingPortAttach => "rendering port attach",
        }
    }
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({}/9)", self.name(), self.number())
    }
}

/// Bring-up failed at `stage` with the vendor status `code`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BringupError {
    pub stage: Stage,
    pub code: ErrorCode,
}

impl core::fmt::Display for BringupError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "display bring-up failed at {}: {}", self.stage, self.code)
    }
}

impl core::error::Error for BringupError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BringupState {
    NotStarted,
    /// The named stage and every one before it succeeded
    Completed(Stage),
    Ready,
    Failed(BringupError),
}

/// Outcome of one [`Sequencer::step`]
pub enum Progress<F> {
    /// A stage before the last one succeeded
    Advanced(Stage),
    /// The last stage succeeded
    Ready(RenderingPort<F>),
}

/// One-shot bring-up state machine over a backend
pub struct Sequencer<B> {
    config: Config,
    backend: B,
    state: BringupState,
}

impl<B: PanelBackend> Sequencer<B> {
    pub fn new(config: Config, backend: B) -> Self {
        Self {
            config,
            backend,
            state: BringupState::NotStarted,
        }
    }

    pub fn state(&self) -> BringupState {
        self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Stage the next [`step`](Self::step) would run
    pub fn next_stage(&self) -> Option<Stage> {
        match self.state {
            BringupState::NotStarted => Some(Stage::BacklightEnable),
            BringupState::Completed(stage) => stage.next(),
            BringupState::Ready | BringupState::Failed(_) => None,
        }
    }

    /// Run the next stage
    ///
    /// # Errors
    ///
    /// The stage's error, which also moves the sequencer to `Failed`. Once
    /// `Failed` the same error is returned again; once `Ready` every call
    /// reports `INVALID_STATE` against the last stage.
    pub fn step(&mut self) -> Result<Progress<B::Flush>, BringupError> {
        let stage = match self.state {
            BringupState::Failed(err) => return Err(err),
            BringupState::Ready => {
                return Err(BringupError {
                    stage: Stage::RenderingPortAttach,
                    code: ErrorCode::INVALID_STATE,
                })
            }
            BringupState::NotStarted => Stage::BacklightEnable,
            BringupState::Completed(stage) => match stage.next() {
                Some(next) => next,
                None => Stage::RenderingPortAttach,
            },
        };

        let outcome = match stage {
            Stage::BacklightEnable => self.enable_backlight(),
            Stage::BusInit => self.init_bus(),
            Stage::PanelIoAttach => self.attach_panel_io(),
            Stage::PanelDriverAttach => self.attach_panel_driver(),
            Stage::Reset => self.reset(),
            Stage::Init => self.init(),
            Stage::Orientation => self.orient(),
            Stage::PowerOn => self.power_on(),
            Stage::RenderingPortAttach => {
                return match self.attach_rendering_port() {
                    Ok(port) => {
                        self.state = BringupState::Ready;
                        log::info!("display ready");
                        Ok(Progress::Ready(port))
                    }
                    Err(code) => Err(self.fail(stage, code)),
                };
            }
        };

        match outcome {
            Ok(()) => {
                self.state = BringupState::Completed(stage);
                Ok(Progress::Advanced(stage))
            }
            Err(code) => Err(self.fail(stage, code)),
        }
    }

    /// Run every remaining stage
    pub fn run(&mut self) -> Result<RenderingPort<B::Flush>, BringupError> {
        loop {
            if let Progress::Ready(port) = self.step()? {
                return Ok(port);
            }
        }
    }

    fn fail(&mut self, stage: Stage, code: ErrorCode) -> BringupError {
        let err = BringupError { stage, code };
        log::error!("{}", err);
        self.state = BringupState::Failed(err);
        err
    }

    fn enable_backlight(&mut self) -> Result<(), ErrorCode> {
        log::info!("Turn on the backlight");
        self.backend
            .enable_backlight(self.config.pins.backlight, self.config.backlight_active_high)
    }

    fn init_bus(&mut self) -> Result<(), ErrorCode> {
        log::info!("Initialize SPI bus");
        let bus = BusConfig::from_config(&self.config);
        if bus.max_transfer_size == 0 {
            return Err(ErrorCode::INVALID_SIZE);
        }
        self.backend.init_bus(&bus)
    }

    fn attach_panel_io(&mut self) -> Result<(), ErrorCode> {
        log::info!("Install panel IO");
        self.backend
            .attach_panel_io(&PanelIoConfig::from_config(&self.config))
    }

    fn attach_panel_driver(&mut self) -> Result<(), ErrorCode> {
        log::info!("Install ili9341 panel driver");
        self.backend
            .attach_panel_driver(&PanelDevConfig::from_config(&self.config))
    }

    fn reset(&mut self) -> Result<(), ErrorCode> {
        log::debug!("Reset panel");
        self.backend.reset_panel()
    }

    fn init(&mut self) -> Result<(), ErrorCode> {
        log::debug!("Init panel");
        self.backend.init_panel()
    }

    fn orient(&mut self) -> Result<(), ErrorCode> {
        log::debug!("Mirror panel {:?}", self.config.mirror);
        self.backend.mirror(self.config.mirror)
    }

    fn power_on(&mut self) -> Result<(), ErrorCode> {
        log::debug!("Switch panel on");
        self.backend.power_on()
    }

    fn attach_rendering_port(&mut self) -> Result<RenderingPort<B::Flush>, ErrorCode> {
        log::info!("Attach rendering port");
        let geometry = PortGeometry::from_config(&self.config);
        let buffer = DrawBuffer::allocate(geometry.width, geometry.draw_rows)?;
        let flush = self.backend.attach_flush(&geometry)?;
        RenderingPort::new(flush, buffer, geometry)
    }
}

/// Bring the panel up and hand over the rendering port
///
/// The backend is consumed; whatever it must keep alive after bring-up moves
/// into the flush target.
pub fn bring_up<B: PanelBackend>(
    config: Config,
    backend: B,
) -> Result<RenderingPort<B::Flush>, BringupError> {
    Sequencer::new(config, backend).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyd_panel::mock::{Call, MockBackend};
    use cyd_panel::{Mirror, Resolution};

    fn call_for(stage: Stage) -> Call {
        match stage {
            Stage::BacklightEnable => Call::EnableBacklight,
            Stage::BusInit => Call::InitBus,
            Stage::PanelIoAttach => Call::AttachPanelIo,
            Stage::PanelDriverAttach => Call::AttachPanelDriver,
            Stage::Reset => Call::ResetPanel,
            Stage::Init => Call::InitPanel,
            Stage::Orientation => Call::Mirror,
            Stage::PowerOn => Call::PowerOn,
            Stage::RenderingPortAttach => Call::AttachFlush,
        }
    }

    #[test]
    fn runs_every_stage_in_order() {
        let mut sequencer = Sequencer::new(Config::cyd(), MockBackend::new());
        let mut seen = Vec::new();
        let port = loop {
            match sequencer.step().unwrap() {
                Progress::Advanced(stage) => seen.push(stage),
                Progress::Ready(port) => break port,
            }
        };
        seen.push(Stage::RenderingPortAttach);

        assert_eq!(seen, Stage::ALL);
        assert_eq!(sequencer.state(), BringupState::Ready);
        let expected: Vec<Call> = Stage::ALL.iter().map(|s| call_for(*s)).collect();
        assert_eq!(sequencer.backend().calls(), expected.as_slice());
        assert_eq!(port.geometry().width, 240);
    }

    #[test]
    fn backend_receives_board_parameters() {
        let mut sequencer = Sequencer::new(Config::cyd(), MockBackend::new());
        sequencer.run().unwrap();
        let backend = sequencer.backend();

        assert_eq!(backend.bus().unwrap().max_transfer_size, 240 * 80 * 2);
        assert_eq!(backend.panel_io().unwrap().pclk_hz, 40_000_000);
        assert_eq!(backend.applied_mirror(), Some(Mirror { x: true, y: true }));
        assert_eq!(backend.backlight_level(), Some(true));
        assert!(backend.is_powered());
    }

    #[test]
    fn fault_at_each_stage_stops_there() {
        for (k, stage) in Stage::ALL.iter().enumerate() {
            let backend = MockBackend::new().fail_at(call_for(*stage), ErrorCode::FAIL);
            let mut sequencer = Sequencer::new(Config::cyd(), backend);

            let err = sequencer.run().err().unwrap();
            assert_eq!(err, BringupError { stage: *stage, code: ErrorCode::FAIL });
            assert_eq!(sequencer.state(), BringupState::Failed(err));
            assert_eq!(sequencer.backend().calls().len(), k + 1, "stage {}", stage);
            assert_eq!(sequencer.backend().calls().last(), Some(&call_for(*stage)));
        }
    }

    #[test]
    fn claimed_bus_fails_bus_init() {
        let backend = MockBackend::new().with_claimed_bus();
        let err = bring_up(Config::cyd(), backend).err().unwrap();
        assert_eq!(err.stage, Stage::BusInit);
        assert_eq!(err.code, ErrorCode::INVALID_STATE);
    }

    #[test]
    fn failed_sequencer_stays_failed() {
        let backend = MockBackend::new().fail_at(Call::ResetPanel, ErrorCode::TIMEOUT);
        let mut sequencer = Sequencer::new(Config::cyd(), backend);
        let first = sequencer.run().err().unwrap();
        let again = sequencer.step().err().unwrap();

        assert_eq!(first, again);
        assert_eq!(sequencer.next_stage(), None);
        assert_eq!(sequencer.backend().calls().len(), 5);
    }

    #[test]
    fn ready_sequencer_refuses_more_steps() {
        let mut sequencer = Sequencer::new(Config::cyd(), MockBackend::new());
        sequencer.run().unwrap();
        let err = sequencer.step().err().unwrap();
        assert_eq!(err.code, ErrorCode::INVALID_STATE);
        assert_eq!(sequencer.backend().calls().len(), 9);
    }

    #[test]
    fn draw_buffer_sized_from_config() {
        let config = cyd_panel::Builder::new()
            .resolution(Resolution::new(240, 320).unwrap())
            .draw_rows(40)
            .build()
            .unwrap();
        let mut sequencer = Sequencer::new(config, MockBackend::new());
        let port = sequencer.run().unwrap();
        assert_eq!(port.geometry().draw_rows, 40);
    }

    #[test]
    fn error_display_names_stage_and_code() {
        let err = BringupError {
            stage: Stage::BusInit,
            code: ErrorCode::INVALID_STATE,
        };
        assert_eq!(
            err.to_string(),
            "display bring-up failed at bus init (2/9): ESP_ERR_INVALID_STATE (0x103)"
        );
    }

    #[test]
    fn stage_numbers_follow_order() {
        assert_eq!(Stage::BacklightEnable.number(), 1);
        assert_eq!(Stage::RenderingPortAttach.number(), 9);
        assert_eq!(Stage::PowerOn.next(), Some(Stage::RenderingPortAttach));
        assert_eq!(Stage::RenderingPortAttach.next(), None);
    }
}
