//! PIC18F452 special function register map
//!
//! Addresses and bit masks from the PIC18FXX2 datasheet (DS39564). Only the
//! registers used by this crate are listed.

/// I/O port registers
///
/// PORTx reads the pin levels, LATx holds the output latch and TRISx the
/// direction (1 = input). The three groups sit at fixed offsets from the
/// PORTA address.
pub mod io {
    /// PORTA, first I/O register
    pub const GPIO_BASE: u16 = 0xF80;
    /// Offset of the PORTx registers from [`GPIO_BASE`]
    pub const PORT_OFFSET: u16 = 0;
    /// Offset of the LATx registers from [`GPIO_BASE`]
    pub const LATCH_OFFSET: u16 = 9;
    /// Offset of the TRISx registers from [`GPIO_BASE`]
    pub const TRIS_OFFSET: u16 = 18;

    pub const PORTA: u16 = 0xF80;
    pub const PORTB: u16 = 0xF81;
    pub const PORTC: u16 = 0xF82;
    pub const PORTD: u16 = 0xF83;
    pub const PORTE: u16 = 0xF84;
    pub const LATA: u16 = 0xF89;
    pub const LATB: u16 = 0xF8A;
    pub const LATC: u16 = 0xF8B;
    pub const LATD: u16 = 0xF8C;
    pub const LATE: u16 = 0xF8D;
    pub const TRISA: u16 = 0xF92;
    pub const TRISB: u16 = 0xF93;
    pub const TRISC: u16 = 0xF94;
    pub const TRISD: u16 = 0xF95;
    pub const TRISE: u16 = 0xF96;
}

/// Peripheral interrupt enable register 1
pub const PIE1: u16 = 0xF9D;
/// Peripheral interrupt request (flag) register 1
pub const PIR1: u16 = 0xF9E;
/// Peripheral interrupt priority register 1
pub const IPR1: u16 = 0xF9F;
/// Peripheral interrupt enable register 2
pub const PIE2: u16 = 0xFA0;
/// Peripheral interrupt request (flag) register 2
pub const PIR2: u16 = 0xFA1;
/// Peripheral interrupt priority register 2
pub const IPR2: u16 = 0xFA2;

/// USART receive status and control
pub const RCSTA: u16 = 0xFAB;
/// USART transmit status and control
pub const TXSTA: u16 = 0xFAC;
/// USART transmit data
pub const TXREG: u16 = 0xFAD;
/// USART receive data
pub const RCREG: u16 = 0xFAE;
/// USART baud rate generator
pub const SPBRG: u16 = 0xFAF;

/// Reset control (holds IPEN)
pub const RCON: u16 = 0xFD0;

/// Timer0 control
pub const T0CON: u16 = 0xFD5;
/// Timer0 counter low byte
pub const TMR0L: u16 = 0xFD6;
/// Timer0 counter high byte (buffered)
pub const TMR0H: u16 = 0xFD7;

/// Interrupt control 3 (INT1/INT2)
pub const INTCON3: u16 = 0xFF0;
/// Interrupt control 2 (edges, priorities, PORTB pull-ups)
pub const INTCON2: u16 = 0xFF1;
/// Interrupt control
pub const INTCON: u16 = 0xFF2;

/// INTCON bits
pub mod intcon {
    /// Global interrupt enable (GIEH when IPEN = 1)
    pub const GIE: u8 = 0x80;
    /// Peripheral interrupt enable (GIEL when IPEN = 1)
    pub const PEIE: u8 = 0x40;
    pub const TMR0IE: u8 = 0x20;
    pub const INT0IE: u8 = 0x10;
    pub const RBIE: u8 = 0x08;
    pub const TMR0IF: u8 = 0x04;
    pub const INT0IF: u8 = 0x02;
    pub const RBIF: u8 = 0x01;
}

/// INTCON2 bits
pub mod intcon2 {
    /// PORTB pull-up disable (active low enable)
    pub const RBPU: u8 = 0x80;
    pub const INTEDG0: u8 = 0x40;
    pub const INTEDG1: u8 = 0x20;
    pub const INTEDG2: u8 = 0x10;
    pub const TMR0IP: u8 = 0x04;
    pub const RBIP: u8 = 0x01;
}

/// INTCON3 bits
pub mod intcon3 {
    pub const INT2IP: u8 = 0x80;
    pub const INT1IP: u8 = 0x40;
    pub const INT2IE: u8 = 0x10;
    pub const INT1IE: u8 = 0x08;
    pub const INT2IF: u8 = 0x02;
    pub const INT1IF: u8 = 0x01;
}

/// PIE1 / PIR1 / IPR1 bits (same position in all three registers)
pub mod pir1 {
    /// Parallel slave port read/write
    pub const PSP: u8 = 0x80;
    /// A/D converter
    pub const AD: u8 = 0x40;
    /// USART receive
    pub const RC: u8 = 0x20;
    /// USART transmit
    pub const TX: u8 = 0x10;
    /// Master synchronous serial port
    pub const SSP: u8 = 0x08;
    pub const CCP1: u8 = 0x04;
    /// TMR2 to PR2 match
    pub const TMR2: u8 = 0x02;
    /// TMR1 overflow
    pub const TMR1: u8 = 0x01;
}

/// PIE2 / PIR2 / IPR2 bits
pub mod pir2 {
    /// Data EEPROM/flash write complete
    pub const EE: u8 = 0x10;
    /// Bus collision
    pub const BCL: u8 = 0x08;
    /// Low voltage detect
    pub const LVD: u8 = 0x04;
    /// TMR3 overflow
    pub const TMR3: u8 = 0x02;
    pub const CCP2: u8 = 0x01;
}

/// RCON bits
pub mod rcon {
    /// Interrupt priority levels enable
    pub const IPEN: u8 = 0x80;
}

/// TXSTA bits
pub mod txsta {
    /// Clock source select (synchronous mode: 1 = master, BRG clock)
    pub const CSRC: u8 = 0x80;
    /// 9-bit transmission
    pub const TX9: u8 = 0x40;
    /// Transmit enable
    pub const TXEN: u8 = 0x20;
    /// Synchronous mode
    pub const SYNC: u8 = 0x10;
    /// High baud rate select (asynchronous mode)
    pub const BRGH: u8 = 0x04;
    /// Transmit shift register empty (read-only)
    pub const TRMT: u8 = 0x02;
    /// Ninth transmit data bit
    pub const TX9D: u8 = 0x01;
}

/// RCSTA bits
pub mod rcsta {
    /// Serial port enable
    pub const SPEN: u8 = 0x80;
    /// 9-bit reception
    pub const RX9: u8 = 0x40;
    /// Single receive enable (synchronous master)
    pub const SREN: u8 = 0x20;
    /// Continuous receive enable
    pub const CREN: u8 = 0x10;
    /// Address detect enable (asynchronous 9-bit)
    pub const ADDEN: u8 = 0x08;
    /// Framing error (read-only)
    pub const FERR: u8 = 0x04;
    /// Overrun error (read-only)
    pub const OERR: u8 = 0x02;
    /// Ninth received data bit
    pub const RX9D: u8 = 0x01;
}

/// T0CON bits
pub mod t0con {
    /// Timer0 on
    pub const TMR0ON: u8 = 0x80;
    /// 8-bit mode (cleared: 16-bit)
    pub const T08BIT: u8 = 0x40;
    /// Clock source (set: T0CKI pin, cleared: instruction clock)
    pub const T0CS: u8 = 0x20;
    /// Source edge select
    pub const T0SE: u8 = 0x10;
    /// Prescaler bypass (set: prescaler not assigned)
    pub const PSA: u8 = 0x08;
    /// Prescaler select field T0PS2:T0PS0
    pub const T0PS_MASK: u8 = 0x07;
}
