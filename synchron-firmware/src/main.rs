//! Synchron - IF482 Telegram Generator Firmware
//!
//! Main firmware binary for RP2040-based boards. Sends one IF482 time
//! telegram per second on UART1, timed so that the last character leaves
//! the line as the announced second begins.
//!
//! Pin map:
//! - GPIO3: DS3231 INT/SQW (1 Hz, falling edge)
//! - GPIO4/5: I2C0 SDA/SCL to the DS3231
//! - GPIO8: UART1 TX, telegram output (7E1)
//! - GPIO25: status LED

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{InterruptExecutor, SpawnError, Spawner};
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::uart::UartTx;
use embassy_sync::mutex::Mutex;
use embassy_time::{with_timeout, Duration, Timer, TICK_HZ};
use portable_atomic::Ordering;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use synchron_core::config::{PulseSourceKind, PULSE_PERIOD_MS};
use synchron_core::error::{ConfigurationFault, Fault};
use synchron_core::scheduler::SchedulerTiming;
use synchron_core::status::GeneratorStatus;
use synchron_core::traits::PulseSource;
use synchron_drivers::rtc::Ds3231;
use synchron_drivers::status_led::StatusLed;
use synchron_hal_rp2040::{rp_uart_config, RpOutput, RpUartTx};

use crate::channels::{PULSE_COUNT, STATUS};
use crate::config::GENERATOR_CONFIG;
use crate::tasks::RtcBus;

mod channels;
mod clock;
mod config;
mod tasks;

/// How long start-up may wait for the I2C bus
const BUS_LOCK_TIMEOUT_MS: u64 = 100;

/// Executor for the pulse capture, preempts everything else
static EXECUTOR_PULSE: InterruptExecutor = InterruptExecutor::new();

/// Executor for the telegram generator, below the pulse and above thread mode
static EXECUTOR_GENERATOR: InterruptExecutor = InterruptExecutor::new();

static RTC_BUS: StaticCell<RtcBus> = StaticCell::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_PULSE.on_interrupt()
}

#[interrupt]
unsafe fn SWI_IRQ_0() {
    EXECUTOR_GENERATOR.on_interrupt()
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Synchron IF482 generator starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let led = StatusLed::new(RpOutput::new(Output::new(p.PIN_25, Level::Low)), false);
    match tasks::status_task(led) {
        Ok(token) => spawner.spawn(token),
        Err(e) => error!("Status task not started: {}", e),
    }

    let armed = async {
        let config = GENERATOR_CONFIG;
        config.validate()?;
        let timing = SchedulerTiming::from_config(&config, TICK_HZ)?;
        info!(
            "Config: {} baud 7E1, {} pulse, resync every {}s",
            config.baudrate, config.pulse_source, config.resync_interval_s
        );

        let i2c = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c::Config::default());
        let bus: &'static RtcBus = RTC_BUS.init(Mutex::new(Ds3231::new(i2c)));

        interrupt::SWI_IRQ_1.set_priority(Priority::P2);
        let pulse_spawner = EXECUTOR_PULSE.start(interrupt::SWI_IRQ_1);

        match config.pulse_source {
            PulseSourceKind::Rtc => {
                {
                    let mut rtc = with_timeout(
                        Duration::from_millis(BUS_LOCK_TIMEOUT_MS),
                        bus.lock(),
                    )
                    .await
                    .map_err(|_| ConfigurationFault::BusBusy)?;
                    rtc.configure(1000 / PULSE_PERIOD_MS)?;
                }
                info!("DS3231 square wave armed at 1 Hz");

                let sqw = Input::new(p.PIN_3, Pull::Up);
                pulse_spawner.spawn(tasks::rtc_pulse_task(sqw).map_err(task_fault)?);
            }
            PulseSourceKind::Timer => {
                warn!("No RTC pulse configured, using hardware timer");
                let period = Duration::from_millis(PULSE_PERIOD_MS as u64);
                pulse_spawner.spawn(tasks::timer_pulse_task(period).map_err(task_fault)?);
            }
        }

        let uart = UartTx::new_blocking(p.UART1, p.PIN_8, rp_uart_config(&config.serial_config()));
        let tx = RpUartTx::new(uart);

        spawner.spawn(tasks::clock_sync_task(bus, config.resync_interval_s).map_err(task_fault)?);

        interrupt::SWI_IRQ_0.set_priority(Priority::P3);
        let generator_spawner = EXECUTOR_GENERATOR.start(interrupt::SWI_IRQ_0);
        generator_spawner.spawn(tasks::generator_task(tx, timing).map_err(task_fault)?);
        Ok::<(), Fault>(())
    }
    .await;

    match armed {
        Ok(()) => info!("All tasks spawned, generator running"),
        Err(fault) => {
            error!("Generator not running: {}", fault);
            STATUS.signal(GeneratorStatus::Fault);
        }
    }

    loop {
        Timer::after_secs(60).await;
        trace!("Main loop heartbeat, {} pulses", PULSE_COUNT.load(Ordering::Relaxed));
    }
}

fn task_fault(e: SpawnError) -> Fault {
    error!("Task spawn failed: {}", e);
    Fault::TaskCreation
}
