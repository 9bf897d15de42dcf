//! Embassy runtime wiring: peripherals, tasks, and the control loop.
//!
//! One task owns the robot wholesale and runs the polling control cycle;
//! a second feeds received serial bytes into a channel so the loop can
//! consume them without blocking; a third advances the shared millisecond
//! counter. Nothing else touches `RobotState`.

use core::fmt::Write as _;

use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::adc::{Adc, AdcChannel as _};
use embassy_stm32::bind_interrupts;
use embassy_stm32::gpio::{Level, Output, OutputType, Speed};
use embassy_stm32::mode::Async;
use embassy_stm32::peripherals;
use embassy_stm32::time::hz;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::usart::{self, Config as UartConfig, Uart, UartTx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Ticker};
use heapless::String;

use trailbot_core::machine::RobotState;
use trailbot_core::status::Notice;

use crate::config;
use crate::hw::clock;
use crate::hw::leds::ShiftRegisterLeds;
use crate::hw::motors::HBridgeMotors;
use crate::hw::reset::WatchdogReset;
use crate::hw::sensors::AdcSensors;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

bind_interrupts!(struct Irqs {
    USART1 => usart::InterruptHandler<peripherals::USART1>;
});

/// Serial bytes waiting for the control loop. Deep enough that a burst of
/// keypresses between cycles cannot drop a command.
static RX_BYTES: Channel<CriticalSectionRawMutex, u8, 16> = Channel::new();

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let p = hal::init(hal::Config::default());

    let pwm = SimplePwm::new(
        p.TIM3,
        Some(PwmPin::new_ch1(p.PA6, OutputType::PushPull)),
        Some(PwmPin::new_ch2(p.PA7, OutputType::PushPull)),
        None,
        None,
        hz(1_000),
        Default::default(),
    );
    let motors = HBridgeMotors::new(
        pwm,
        Output::new(p.PB3, Level::Low, Speed::Low),
        Output::new(p.PB4, Level::Low, Speed::Low),
        Output::new(p.PB5, Level::Low, Speed::Low),
        Output::new(p.PB6, Level::Low, Speed::Low),
    );

    let sensors = AdcSensors::new(
        Adc::new(p.ADC1),
        p.PA0.degrade_adc(),
        p.PA1.degrade_adc(),
        p.PA4.degrade_adc(),
        p.PB1.degrade_adc(),
    );

    let leds = ShiftRegisterLeds::new(
        Output::new(p.PB7, Level::Low, Speed::Low),
        Output::new(p.PB8, Level::Low, Speed::Low),
    );

    let reset = WatchdogReset::new(p.IWDG);

    let mut uart_config = UartConfig::default();
    uart_config.baudrate = config::LINK_BAUD;
    let uart = Uart::new(
        p.USART1,
        p.PA10,
        p.PA9,
        Irqs,
        p.DMA1_CH1,
        p.DMA1_CH2,
        uart_config,
    )
    .expect("usart init");
    let (tx, rx) = uart.split();

    spawner.spawn(millis_task()).expect("spawn millis task");
    spawner.spawn(serial_rx_task(rx)).expect("spawn serial task");
    spawner
        .spawn(control_task(motors, sensors, leds, reset, tx))
        .expect("spawn control task");
}

/// Advances the shared millisecond counter the scheduler bank feeds on.
#[embassy_executor::task]
async fn millis_task() -> ! {
    let mut ticker = Ticker::every(Duration::from_millis(1));
    loop {
        ticker.next().await;
        clock::advance();
    }
}

/// Pushes every received byte into the command channel; a full channel
/// drops the byte, matching the lossy original link.
#[embassy_executor::task]
async fn serial_rx_task(mut rx: usart::UartRx<'static, Async>) -> ! {
    let mut buffer = [0u8; 1];
    loop {
        if rx.read(&mut buffer).await.is_ok() {
            let _ = RX_BYTES.try_send(buffer[0]);
        }
    }
}

/// The polling control loop: one core cycle per tick, outputs rendered to
/// the serial console and the LED chain.
#[embassy_executor::task]
async fn control_task(
    mut motors: HBridgeMotors<'static, peripherals::TIM3>,
    mut sensors: AdcSensors<'static, peripherals::ADC1>,
    mut leds: ShiftRegisterLeds<'static>,
    mut reset: WatchdogReset<'static>,
    mut tx: UartTx<'static, Async>,
) -> ! {
    let mut robot = RobotState::new();
    let mut ticker = Ticker::every(Duration::from_millis(config::CONTROL_PERIOD_MS));

    defmt::info!("control loop up");
    let _ = tx.blocking_write(b"trailbot ready, send ? for help\n");

    loop {
        ticker.next().await;

        let input = RX_BYTES.try_receive().ok();
        let out = robot.cycle(clock::now(), input, &mut sensors, &mut motors, &mut reset);

        for notice in &out.notices {
            send_notice(&mut tx, notice);
        }
        if let Some(frame) = out.telemetry {
            let line = frame.render();
            let _ = tx.blocking_write(line.as_bytes());
        }
        if let Some(frame) = out.led {
            leds.apply(frame);
        }
    }
}

fn send_notice(tx: &mut UartTx<'static, Async>, notice: &Notice) {
    defmt::info!("{}", defmt::Display2Format(notice));

    // The longest notice is the full help listing, well under the buffer.
    let mut text: String<512> = String::new();
    let _ = writeln!(text, "{notice}");
    let _ = tx.blocking_write(text.as_bytes());
}
